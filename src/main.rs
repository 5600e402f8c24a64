//! nala-catalog: Spain vs Romania catalog price dashboard
//!
//! This is the main entrypoint that loads the catalogs, applies the selected
//! filters, prints the summary and renders the charts.

use anyhow::Result;
use clap::Parser;
use nala_catalog::{logging, viz, Args, CatalogCache, CatalogError};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

fn main() -> ExitCode {
    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = logging::init_tracing(args.log_filter()) {
        eprintln!("{e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(CatalogError::Schema(missing)) = e.downcast_ref::<CatalogError>() {
                error!(?missing, "Required columns missing, refusing to render");
            } else {
                error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let filter = args.filter()?;
    let paths = args.catalog_paths();

    let mut cache = CatalogCache::new();
    let catalog = cache.get_or_load(&paths)?;

    if let Some(reason) = &catalog.fallback {
        println!("⚠ Using the built-in example dataset: {reason}");
    }
    info!(
        rows = catalog.len(),
        spain = %paths.spain.display(),
        romania = %paths.romania.display(),
        "Catalog loaded"
    );

    let view = filter.apply(&catalog.products, catalog.has_categories());
    info!(selected = view.len(), "Filters applied");

    viz::print_dashboard_summary(&view, catalog.has_categories());

    if !args.no_charts {
        let written =
            viz::generate_dashboard_charts(&view, catalog.has_categories(), &args.output_dir)?;
        println!("\n✓ {} charts saved to {}", written.len(), args.output_dir.display());
    }

    info!(elapsed_s = start_time.elapsed().as_secs_f64(), "Dashboard complete");
    Ok(())
}
