//! Error types raised while building the unified catalog

use std::path::PathBuf;

use polars::prelude::PolarsError;

use crate::model::Market;

/// Failures of the load/normalize pipeline
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An input file is missing, unreadable or malformed. Recoverable via the fallback dataset.
    #[error("failed to load {market} catalog from {}: {source}", path.display())]
    Load {
        market: Market,
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// The unified table lacks columns the analysis depends on
    #[error("missing required columns: {0:?}")]
    Schema(Vec<String>),

    /// A `país` value that is neither Spain nor Romania
    #[error("unrecognised market value {0:?}")]
    UnknownMarket(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
