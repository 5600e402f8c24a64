//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::analysis::CatalogFilter;
use crate::data::CatalogPaths;
use crate::model::Market;

/// Spain vs Romania catalog price dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the Spanish catalog CSV
    #[arg(long, default_value = "./nala_es.csv")]
    pub spain: PathBuf,

    /// Path to the Romanian catalog CSV
    #[arg(long, default_value = "./nala_ro.csv")]
    pub romania: PathBuf,

    /// Directory the PNG charts are written to
    #[arg(short, long, default_value = "charts")]
    pub output_dir: PathBuf,

    /// Markets to include, e.g. `--market es --market ro`. Defaults to all
    #[arg(short, long)]
    pub market: Vec<String>,

    /// Categories (`categoria_general`) to include. Defaults to all
    #[arg(short, long)]
    pub category: Vec<String>,

    /// Print the report without rendering charts
    #[arg(long)]
    pub no_charts: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths::new(&self.spain, &self.romania)
    }

    /// Parse the market selection; an empty selection means every market
    pub fn parse_markets(&self) -> crate::Result<Option<Vec<Market>>> {
        if self.market.is_empty() {
            return Ok(None);
        }

        let mut markets = Vec::new();
        for value in &self.market {
            let market: Market = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid market value: {}", value))?;
            if !markets.contains(&market) {
                markets.push(market);
            }
        }
        Ok(Some(markets))
    }

    /// Build the catalog filter from `--market` and `--category`
    pub fn filter(&self) -> crate::Result<CatalogFilter> {
        let categories = if self.category.is_empty() {
            None
        } else {
            Some(self.category.clone())
        };

        Ok(CatalogFilter {
            markets: self.parse_markets()?,
            categories,
        })
    }

    /// Default log filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "nala_catalog=debug,info"
        } else {
            "info"
        }
    }
}
