#![forbid(unsafe_code)]

//! Optional `tracing` subscriber setup for binaries embedding Arbor.
//!
//! Libraries only emit events; this module exists so that a host without its
//! own subscriber can get readable output with one call. `RUST_LOG` takes
//! precedence over the filter passed in.

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Build the filter: `RUST_LOG` if set and valid, otherwise `default_filter`.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_filter)?),
    }
}

/// Install a global `fmt` subscriber filtered by [`env_filter`].
///
/// Fails if a global subscriber is already set.
pub fn init_logging(default_filter: &str) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(true)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}
