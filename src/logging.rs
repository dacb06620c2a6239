//! Logging setup.
//!
//! Events go to stderr so they never mix with the chart on stdout. The
//! filter comes from `RUST_LOG` and defaults to warnings only.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "warn";

pub fn init(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = Registry::default()
        .with(build_env_filter(verbose))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
