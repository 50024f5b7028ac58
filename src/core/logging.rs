//! Diagnostic logging to stderr
//!
//! Filter priority: `PARTNUM_LOG`, then `--verbose` (debug), then the
//! configured level. Standard output stays reserved for command results.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const ENV_LOG: &str = "PARTNUM_LOG";

/// Build the filter from the environment, flags and configured level
pub fn build_filter(configured: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return filter;
    }
    let level = if verbose { "debug" } else { configured };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Calling this twice is a no-op.
pub fn init(configured: &str, verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(configured, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
