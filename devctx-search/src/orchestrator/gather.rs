use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregator::aggregate;
use crate::analyzer::{QueryAnalysis, QueryAnalyzer};
use crate::cache::{CacheKey, ResultCache};
use crate::config::{GatherConfig, MAX_RESULTS_LIMIT};
use crate::error::{Result, SearchError};
use crate::rate_limit::RateLimiter;
use crate::ranker::Ranker;
use crate::source::SourceAdapter;
use crate::sources;
use crate::types::{Depth, GatherContextResult, GatherRequest, NormalizedResult, Source};

/// Per-source result multiplier for [`Depth::Thorough`].
const THOROUGH_MULTIPLIER: usize = 2;

/// A request with configured defaults filled in and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub query: String,
    /// Distinct sources in request order.
    pub sources: Vec<Source>,
    pub max_results: usize,
    pub depth: Depth,
}

impl ResolvedRequest {
    /// Fill defaults from `config` and validate.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] for an empty query, an empty
    /// source list, or `max_results` outside `1..=50`.
    pub fn resolve(request: &GatherRequest, config: &GatherConfig) -> Result<Self> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest("query must not be empty".into()));
        }

        let mut sources: Vec<Source> = Vec::new();
        for source in request.sources.as_deref().unwrap_or(&config.sources) {
            if !sources.contains(source) {
                sources.push(*source);
            }
        }
        if sources.is_empty() {
            return Err(SearchError::InvalidRequest(
                "at least one source must be requested".into(),
            ));
        }

        let max_results = request.max_results.unwrap_or(config.max_results);
        if max_results == 0 || max_results > MAX_RESULTS_LIMIT {
            return Err(SearchError::InvalidRequest(format!(
                "maxResults must be between 1 and {MAX_RESULTS_LIMIT}"
            )));
        }

        Ok(Self {
            query: query.to_owned(),
            sources,
            max_results,
            depth: request.depth.unwrap_or(config.depth),
        })
    }

    /// Results requested from each source.
    pub fn per_source_results(&self) -> usize {
        match self.depth {
            Depth::Quick => self.max_results,
            Depth::Thorough => self.max_results * THOROUGH_MULTIPLIER,
        }
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.query, &self.sources, self.max_results, self.depth)
    }
}

struct SourceSlot {
    adapter: Arc<dyn SourceAdapter>,
    limiter: RateLimiter,
}

/// Runs the gather pipeline against a fixed set of source adapters.
///
/// Holds the compiled analyzer, the ranker, the bundle cache and one rate
/// limiter per adapter. Safe to share between concurrent requests.
pub struct Gatherer {
    config: GatherConfig,
    analyzer: QueryAnalyzer,
    ranker: Ranker,
    cache: ResultCache,
    slots: BTreeMap<Source, SourceSlot>,
}

impl std::fmt::Debug for Gatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatherer")
            .field("sources", &self.slots.keys().collect::<Vec<_>>())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Gatherer {
    /// Build a gatherer over `adapters`. A later adapter for the same
    /// source replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn new(config: GatherConfig, adapters: Vec<Arc<dyn SourceAdapter>>) -> Result<Self> {
        config.validate()?;

        let slots = adapters
            .into_iter()
            .map(|adapter| {
                let source = adapter.source();
                let limiter = RateLimiter::new(source, config.rate_limits.for_source(source).clone());
                (source, SourceSlot { adapter, limiter })
            })
            .collect();

        Ok(Self {
            analyzer: QueryAnalyzer::new(),
            ranker: Ranker::new(config.scoring.clone()),
            cache: ResultCache::new(config.cache_ttl_seconds, config.cache_capacity),
            slots,
            config,
        })
    }

    /// Build a gatherer with the HTTP adapter for every known source.
    pub fn with_http_sources(config: GatherConfig) -> Result<Self> {
        let adapters = sources::http_adapters(&config)?;
        Self::new(config, adapters)
    }

    pub fn config(&self) -> &GatherConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Analyze `query` without fetching anything.
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        self.analyzer.analyze(query)
    }

    /// Gather, rank and aggregate developer context for `request`.
    ///
    /// Only request validation can fail. When every source fails the
    /// result is a well-formed empty bundle.
    pub async fn gather(&self, request: &GatherRequest) -> Result<GatherContextResult> {
        let started = Instant::now();
        let request = ResolvedRequest::resolve(request, &self.config)?;

        let key = request.cache_key();
        if let Some(mut cached) = self.cache.get(&key).await {
            cached.stats.cache_hits += 1;
            cached.stats.elapsed_ms = elapsed_ms(started);
            tracing::debug!(elapsed_ms = cached.stats.elapsed_ms, "gather served from cache");
            return Ok(cached);
        }

        let analysis = self.analyzer.analyze(&request.query);
        let (results, incomplete) = self.fetch_all(&request, &analysis).await;

        let fetched = results.len();
        let results = dedup_by_url(results);
        let ranked = self
            .ranker
            .rank(&request.query, Some(analysis.category), results);

        let incomplete = (!incomplete.is_empty()).then_some(incomplete);
        let bundle = aggregate(&ranked, elapsed_ms(started), 0, incomplete);

        tracing::info!(
            category = %analysis.category,
            sources = request.sources.len(),
            fetched,
            ranked = ranked.len(),
            incomplete = bundle.stats.incomplete_sources.as_ref().map_or(0, Vec::len),
            elapsed_ms = bundle.stats.elapsed_ms,
            "gather complete"
        );

        self.cache.insert(key, bundle.clone()).await;
        Ok(bundle)
    }

    /// Query every requested source concurrently. Returns the merged
    /// results and the sources that failed.
    async fn fetch_all(
        &self,
        request: &ResolvedRequest,
        analysis: &QueryAnalysis,
    ) -> (Vec<NormalizedResult>, Vec<Source>) {
        let per_source = request.per_source_results();
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        let fetches = request.sources.iter().map(|&source| async move {
            let outcome = self
                .fetch_one(source, per_source, timeout, analysis)
                .await;
            (source, outcome)
        });
        let outcomes = futures::future::join_all(fetches).await;

        let mut results = Vec::new();
        let mut incomplete = Vec::new();
        for (source, outcome) in outcomes {
            match outcome {
                Ok(source_results) => {
                    tracing::debug!(%source, count = source_results.len(), "source returned results");
                    results.extend(source_results);
                }
                Err(err) => {
                    tracing::warn!(%source, error = %err, "source query failed");
                    incomplete.push(source);
                }
            }
        }
        (results, incomplete)
    }

    async fn fetch_one(
        &self,
        source: Source,
        max_results: usize,
        timeout: Duration,
        analysis: &QueryAnalysis,
    ) -> Result<Vec<NormalizedResult>> {
        let slot = self
            .slots
            .get(&source)
            .ok_or_else(|| SearchError::Config(format!("no adapter registered for {source}")))?;

        let strategy = analysis.strategy_for(source);
        let query = strategy.query.as_deref().unwrap_or(&analysis.query);
        let adapter = &slot.adapter;
        let strategy = &strategy;

        let call = slot.limiter.execute(move || {
            adapter.search(query, max_results, strategy, analysis.category)
        });
        match tokio::time::timeout(timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SearchError::Timeout(format!(
                "{source} did not respond within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Drop later results whose URL was already seen.
fn dedup_by_url(results: Vec<NormalizedResult>) -> Vec<NormalizedResult> {
    let mut seen: HashSet<String> = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
