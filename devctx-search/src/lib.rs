//! # devctx-search
//!
//! Gathers developer-support content (Q&A posts, issues, forum threads)
//! from Stack Overflow, GitHub and Reddit and reduces it to one ranked,
//! de-duplicated bundle of citations and code excerpts.
//!
//! ## Pipeline
//!
//! 1. [`analyzer`] classifies the query into a problem category, extracts
//!    technology and version signals, and derives a search strategy per
//!    source.
//! 2. [`orchestrator`] queries every requested source concurrently through
//!    its [`rate_limit::RateLimiter`]. A failing source contributes zero
//!    results and is reported as incomplete.
//! 3. [`ranker`] scores heterogeneous results onto one comparable scale.
//! 4. [`aggregator`] reduces the ranked set to a bounded summary, highlight,
//!    citation and snippet bundle.
//!
//! ## Security
//!
//! - No API keys or credentials are configured or sent
//! - No network listeners; this is a library
//! - Query text is logged only at trace level

pub mod aggregator;
pub mod analyzer;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod rate_limit;
pub mod ranker;
pub mod source;
pub mod sources;
pub mod types;

pub use analyzer::{QueryAnalysis, QueryAnalyzer, SearchStrategy, Specificity};
pub use config::{GatherConfig, MAX_RESULTS_LIMIT};
pub use error::{Result, SearchError};
pub use orchestrator::Gatherer;
pub use ranker::{Ranker, ScoringConfig};
pub use source::SourceAdapter;
pub use types::{
    Citation, CodeSnippet, CollectedSnippet, Depth, GatherContextResult, GatherRequest,
    GatherStats, NormalizedResult, ProblemCategory, RankedResult, Source,
};

/// Gather developer context for `request` from the public source APIs.
///
/// Builds a one-off [`Gatherer`] with the HTTP adapters. Long-running
/// callers should keep a [`Gatherer`] instead so the cache and rate
/// limiters persist between requests.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid and
/// [`SearchError::InvalidRequest`] if `request` is. Source failures are
/// never errors; they appear in `stats.incomplete_sources`.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> devctx_search::Result<()> {
/// let config = devctx_search::GatherConfig::default();
/// let request = devctx_search::GatherRequest::new("react useEffect runs twice");
/// let bundle = devctx_search::gather_developer_context(&request, &config).await?;
/// println!("{}", bundle.summary);
/// for citation in &bundle.citations {
///     println!("{}: {}", citation.title, citation.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn gather_developer_context(
    request: &GatherRequest,
    config: &GatherConfig,
) -> Result<GatherContextResult> {
    let gatherer = Gatherer::with_http_sources(config.clone())?;
    gatherer.gather(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_zero_max_results_config() {
        let config = GatherConfig {
            max_results: 0,
            ..Default::default()
        };
        let result = gather_developer_context(&GatherRequest::new("test"), &config).await;
        assert!(result.unwrap_err().to_string().contains("max_results"));
    }

    #[tokio::test]
    async fn rejects_empty_sources_config() {
        let config = GatherConfig {
            sources: vec![],
            ..Default::default()
        };
        let result = gather_developer_context(&GatherRequest::new("test"), &config).await;
        assert!(result.unwrap_err().to_string().contains("source"));
    }

    #[tokio::test]
    async fn rejects_empty_query_before_any_request() {
        let result =
            gather_developer_context(&GatherRequest::new("   "), &GatherConfig::default()).await;
        assert!(matches!(result, Err(SearchError::InvalidRequest(_))));
    }
}
