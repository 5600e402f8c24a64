//! Tracing subscriber setup for the binary

use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) -> crate::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
