//! Logging bootstrap for binaries.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "wineguessr=info";

/// Installs a compact `tracing` subscriber filtered by `RUST_LOG`
/// (default `wineguessr=info`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .compact()
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
