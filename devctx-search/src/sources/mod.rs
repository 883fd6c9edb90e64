//! Source adapter implementations.
//!
//! Each adapter turns one public API into [`crate::types::NormalizedResult`]
//! values. None of them send credentials.

pub mod extract;
pub mod github;
pub mod reddit;
pub mod stackoverflow;
pub mod url_normalize;

use std::sync::Arc;

pub use github::GitHubAdapter;
pub use reddit::RedditAdapter;
pub use stackoverflow::StackOverflowAdapter;

use crate::config::GatherConfig;
use crate::error::Result;
use crate::http;
use crate::source::SourceAdapter;
use crate::types::Source;

/// The HTTP adapter for `source`, pointed at its configured base URL.
pub fn http_adapter(
    source: Source,
    client: reqwest::Client,
    config: &GatherConfig,
) -> Arc<dyn SourceAdapter> {
    let base_url = config.endpoints.for_source(source);
    match source {
        Source::StackOverflow => Arc::new(StackOverflowAdapter::new(client, base_url)),
        Source::GitHub => Arc::new(GitHubAdapter::new(client, base_url)),
        Source::Reddit => Arc::new(RedditAdapter::new(client, base_url)),
    }
}

/// One HTTP adapter per known source, sharing a single client.
///
/// # Errors
///
/// Returns [`crate::SearchError::Http`] if the client cannot be built.
pub fn http_adapters(config: &GatherConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let client = http::build_client(config)?;
    Ok(Source::all()
        .iter()
        .map(|source| http_adapter(*source, client.clone(), config))
        .collect())
}

/// Appends `NOT term` clauses, quoting multi-word terms. Both GitHub and
/// Reddit search accept this syntax.
pub(crate) fn with_exclusions(query: &str, terms: &[String]) -> String {
    let mut q = query.trim().to_owned();
    for term in terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if term.contains(char::is_whitespace) {
            q.push_str(&format!(" NOT \"{term}\""));
        } else {
            q.push_str(&format!(" NOT {term}"));
        }
    }
    q
}
