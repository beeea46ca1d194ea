#![forbid(unsafe_code)]

//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingOptions;

/// Installs a stderr `fmt` subscriber filtered by `options`.
///
/// `RUST_LOG` takes precedence when set. Returns `false` if a global
/// subscriber was already installed, which leaves the existing one in place.
pub fn init(options: &LoggingOptions) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(options.directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
