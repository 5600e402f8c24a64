//! nala-catalog: price comparison of the Spanish and Romanian product catalogs
//!
//! This library loads both catalogs, strips bundles, converts prices to euros
//! and classifies each product into a market-local price tier, then exposes the
//! aggregations and charts of the comparison dashboard.

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use analysis::CatalogFilter;
pub use cache::CatalogCache;
pub use cli::Args;
pub use data::{combine, load_and_clean, load_catalog, Catalog, CatalogPaths};
pub use error::CatalogError;
pub use model::{classify_tier, convert_to_reference, Market, PricedProduct, Tier};
pub use viz::generate_dashboard_charts;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
