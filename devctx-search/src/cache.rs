//! In-memory LRU cache for gathered bundles.
//!
//! Keyed by the request fingerprint (normalised query, source set, result
//! count, depth). Uses [`moka`] for async-friendly caching with TTL and
//! automatic eviction. Each [`crate::Gatherer`] owns its own cache.

use std::collections::BTreeSet;
use std::time::Duration;

use moka::future::Cache;

use crate::types::{Depth, GatherContextResult, Source};

/// Request fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query with inner whitespace collapsed.
    query: String,
    /// Sorted, de-duplicated source set.
    sources: Vec<Source>,
    max_results: usize,
    depth: Depth,
}

impl CacheKey {
    /// Build a deterministic key.
    ///
    /// `[GitHub, Reddit]` and `[Reddit, GitHub]` produce the same key, as do
    /// `"Tokio  Panic "` and `"tokio panic"`.
    pub fn new(query: &str, sources: &[Source], max_results: usize, depth: Depth) -> Self {
        let query = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let sources: BTreeSet<Source> = sources.iter().copied().collect();
        Self {
            query,
            sources: sources.into_iter().collect(),
            max_results,
            depth,
        }
    }
}

/// Bundle cache. Disabled when the TTL is zero.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<CacheKey, GatherContextResult>>,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl ResultCache {
    /// A TTL- and capacity-bounded cache. A zero TTL or zero capacity turns
    /// caching off.
    pub fn new(ttl_seconds: u64, capacity: u64) -> Self {
        if ttl_seconds == 0 || capacity == 0 {
            tracing::debug!(ttl_seconds, capacity, "result cache disabled");
            return Self::disabled();
        }
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        Self { inner: Some(cache) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Cached bundle for `key`, if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Option<GatherContextResult> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, bundle: GatherContextResult) {
        if let Some(cache) = &self.inner {
            cache.insert(key, bundle).await;
        }
    }

    /// Drop every cached bundle.
    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GatherStats;

    fn bundle(summary: &str) -> GatherContextResult {
        GatherContextResult {
            summary: summary.into(),
            highlights: vec![],
            citations: vec![],
            snippets: vec![],
            stats: GatherStats::default(),
        }
    }

    fn key(query: &str) -> CacheKey {
        CacheKey::new(query, Source::all(), 10, Depth::Quick)
    }

    #[test]
    fn key_ignores_source_order_and_duplicates() {
        let a = CacheKey::new("q", &[Source::GitHub, Source::Reddit], 10, Depth::Quick);
        let b = CacheKey::new(
            "q",
            &[Source::Reddit, Source::GitHub, Source::Reddit],
            10,
            Depth::Quick,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn key_normalises_query() {
        assert_eq!(key("  Tokio   PANIC "), key("tokio panic"));
    }

    #[test]
    fn key_differs_on_every_dimension() {
        let base = CacheKey::new("q", &[Source::GitHub], 10, Depth::Quick);
        assert_ne!(base, CacheKey::new("r", &[Source::GitHub], 10, Depth::Quick));
        assert_ne!(base, CacheKey::new("q", &[Source::Reddit], 10, Depth::Quick));
        assert_ne!(base, CacheKey::new("q", &[Source::GitHub], 5, Depth::Quick));
        assert_ne!(base, CacheKey::new("q", &[Source::GitHub], 10, Depth::Thorough));
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ResultCache::new(600, 10);
        assert!(cache.get(&key("cache miss")).await.is_none());

        cache.insert(key("cache hit"), bundle("cached")).await;
        let cached = cache.get(&key("Cache  Hit")).await.expect("should be cached");
        assert_eq!(cached.summary, "cached");
    }

    #[tokio::test]
    async fn overwrite_same_key_updates_value() {
        let cache = ResultCache::new(600, 10);
        cache.insert(key("q"), bundle("old")).await;
        cache.insert(key("q"), bundle("new")).await;
        assert_eq!(cache.get(&key("q")).await.map(|b| b.summary).as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = ResultCache::new(0, 10);
        assert!(!cache.is_enabled());
        cache.insert(key("q"), bundle("x")).await;
        assert!(cache.get(&key("q")).await.is_none());
    }

    #[tokio::test]
    async fn zero_capacity_disables_cache() {
        let cache = ResultCache::new(600, 0);
        assert!(!cache.is_enabled());
        cache.insert(key("q"), bundle("x")).await;
        assert!(cache.get(&key("q")).await.is_none());
    }

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let cache = ResultCache::disabled();
        assert!(!cache.is_enabled());
        cache.insert(key("q"), bundle("x")).await;
        assert!(cache.get(&key("q")).await.is_none());
        cache.clear();
    }

    #[tokio::test]
    async fn clear_drops_entries() {
        let cache = ResultCache::new(600, 10);
        cache.insert(key("q"), bundle("x")).await;
        cache.clear();
        assert!(cache.get(&key("q")).await.is_none());
    }
}
