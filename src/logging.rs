//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{HostError, Result};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `config.level`. Stdout stays free for
/// the JSON protocol.
///
/// # Errors
///
/// Returns [`HostError::Config`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = config.level.trim().to_lowercase();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .try_init()
        .map_err(|e| HostError::Config(format!("failed to initialise logging: {e}")))
}
