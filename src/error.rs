//! Error types for the devctx host.

use devctx_search::SearchError;

/// Top-level error type for the host process.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration file or value error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading from or writing to the command channel failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// A command or response envelope could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error raised by the gather pipeline.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, HostError>;
