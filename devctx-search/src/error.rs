//! Error types for the devctx-search crate.
//!
//! Messages are stable strings suitable for returning to a tool caller.
//! Query text is never embedded in error messages.

/// Errors that can occur while gathering developer context.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A source call did not finish within its time budget.
    #[error("source timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A source signalled that the caller is being rate limited.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Failed to parse a source response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid gather configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The incoming request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    /// Whether the retry layer should try this call again.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Convenience type alias for devctx-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
