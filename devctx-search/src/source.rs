//! Trait definition for pluggable developer-content sources.
//!
//! Each source (Stack Overflow, GitHub, Reddit) implements
//! [`SourceAdapter`] to turn a query and its derived strategy into
//! [`NormalizedResult`] values.

use async_trait::async_trait;

use crate::analyzer::SearchStrategy;
use crate::error::Result;
use crate::types::{NormalizedResult, ProblemCategory, Source};

/// A pluggable content source.
///
/// Implementors handle their own URL construction, request, response
/// parsing and normalisation. Records that cannot be normalised are
/// skipped, not reported as errors.
///
/// All implementations must be `Send + Sync`; the orchestrator holds them
/// as `Arc<dyn SourceAdapter>` and queries them concurrently.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch up to `max_results` results for `query`.
    ///
    /// `strategy` carries advisory hints for this source. `query` is the
    /// strategy's replacement text when it has one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::RateLimited`] when the source
    /// throttles the caller, and [`crate::SearchError::Http`] or
    /// [`crate::SearchError::Parse`] for other failures.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        strategy: &SearchStrategy,
        category: ProblemCategory,
    ) -> Result<Vec<NormalizedResult>>;

    /// Which [`Source`] this adapter serves.
    fn source(&self) -> Source;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use chrono::Utc;
    use std::sync::Arc;

    struct MockAdapter {
        source: Source,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl SourceAdapter for MockAdapter {
        async fn search(
            &self,
            _query: &str,
            max_results: usize,
            _strategy: &SearchStrategy,
            _category: ProblemCategory,
        ) -> Result<Vec<NormalizedResult>> {
            if self.titles.is_empty() {
                return Err(SearchError::Http("mock adapter failure".into()));
            }
            Ok(self
                .titles
                .iter()
                .take(max_results)
                .map(|title| NormalizedResult {
                    title: (*title).into(),
                    url: format!("https://example.com/{title}"),
                    source: self.source,
                    author: "mock".into(),
                    created_at: Utc::now(),
                    updated_at: None,
                    score: 1,
                    content: String::new(),
                    code_snippets: vec![],
                    tags: vec![],
                    version: None,
                    is_accepted: None,
                    vote_count: None,
                })
                .collect())
        }

        fn source(&self) -> Source {
            self.source
        }
    }

    #[test]
    fn adapter_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SourceAdapter>();
    }

    #[tokio::test]
    async fn dyn_adapter_respects_max_results() {
        let adapter: Arc<dyn SourceAdapter> = Arc::new(MockAdapter {
            source: Source::Reddit,
            titles: vec!["a", "b", "c"],
        });
        let results = adapter
            .search("q", 2, &SearchStrategy::default(), ProblemCategory::Unknown)
            .await
            .expect("mock search");
        assert_eq!(results.len(), 2);
        assert_eq!(adapter.source(), Source::Reddit);
    }

    #[tokio::test]
    async fn dyn_adapter_propagates_errors() {
        let adapter = MockAdapter {
            source: Source::GitHub,
            titles: vec![],
        };
        let err = adapter
            .search("q", 5, &SearchStrategy::default(), ProblemCategory::Bug)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mock adapter failure"));
    }
}
