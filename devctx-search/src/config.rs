//! Gather configuration with sensible defaults.
//!
//! [`GatherConfig`] controls which sources are queried, per-source result
//! counts, timeouts, caching, rate limiting and the ranking constants.
//! Every field has a default so a partial TOML table deserialises cleanly.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::rate_limit::RateLimitConfig;
use crate::ranker::ScoringConfig;
use crate::types::{Depth, Source};

/// Upper bound on `max_results` accepted from configuration or requests.
pub const MAX_RESULTS_LIMIT: usize = 50;

/// Configuration for a gather operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    /// Sources queried when a request does not name any. Queried concurrently.
    pub sources: Vec<Source>,
    /// Default per-source result count.
    pub max_results: usize,
    /// Default depth when a request does not name one.
    pub depth: Depth,
    /// Per-source time budget in seconds, covering retries.
    pub timeout_seconds: u64,
    /// How long to cache bundles in seconds. Set to 0 to disable caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached bundles before least-recently-used eviction.
    pub cache_capacity: u64,
    /// User-Agent sent to every source API.
    pub user_agent: String,
    /// Base URLs of the source APIs.
    pub endpoints: SourceEndpoints,
    /// Per-source throttling and retry settings.
    pub rate_limits: SourceRateLimits,
    /// Ranking constants.
    pub scoring: ScoringConfig,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            sources: Source::all().to_vec(),
            max_results: 10,
            depth: Depth::Quick,
            timeout_seconds: 10,
            cache_ttl_seconds: 600,
            cache_capacity: 100,
            user_agent: concat!("devctx/", env!("CARGO_PKG_VERSION")).to_owned(),
            endpoints: SourceEndpoints::default(),
            rate_limits: SourceRateLimits::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Base URLs for each source API. Overridable for mirrors and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceEndpoints {
    pub stackoverflow: String,
    pub github: String,
    pub reddit: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            stackoverflow: "https://api.stackexchange.com/2.3".into(),
            github: "https://api.github.com".into(),
            reddit: "https://www.reddit.com".into(),
        }
    }
}

impl SourceEndpoints {
    pub fn for_source(&self, source: Source) -> &str {
        match source {
            Source::StackOverflow => &self.stackoverflow,
            Source::GitHub => &self.github,
            Source::Reddit => &self.reddit,
        }
    }
}

/// Rate-limit settings, one block per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRateLimits {
    pub stackoverflow: RateLimitConfig,
    pub github: RateLimitConfig,
    pub reddit: RateLimitConfig,
}

impl Default for SourceRateLimits {
    fn default() -> Self {
        Self {
            stackoverflow: RateLimitConfig {
                min_interval_ms: 100,
                requests_per_interval: 30,
                ..RateLimitConfig::default()
            },
            // Unauthenticated issue search allows 10 requests per minute.
            github: RateLimitConfig {
                min_interval_ms: 1_000,
                requests_per_interval: 10,
                ..RateLimitConfig::default()
            },
            reddit: RateLimitConfig {
                min_interval_ms: 1_000,
                requests_per_interval: 10,
                ..RateLimitConfig::default()
            },
        }
    }
}

impl SourceRateLimits {
    pub fn for_source(&self, source: Source) -> &RateLimitConfig {
        match source {
            Source::StackOverflow => &self.stackoverflow,
            Source::GitHub => &self.github,
            Source::Reddit => &self.reddit,
        }
    }
}

impl GatherConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be in `1..=MAX_RESULTS_LIMIT`
    /// - `timeout_seconds` must be greater than 0
    /// - `sources` must not be empty
    /// - every endpoint must be non-empty
    /// - every rate-limit block and the scoring constants must be valid
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(SearchError::Config(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.sources.is_empty() {
            return Err(SearchError::Config(
                "at least one source must be enabled".into(),
            ));
        }
        for source in Source::all() {
            if self.endpoints.for_source(*source).trim().is_empty() {
                return Err(SearchError::Config(format!(
                    "endpoint for {source} must not be empty"
                )));
            }
            self.rate_limits
                .for_source(*source)
                .validate()
                .map_err(|e| SearchError::Config(format!("{source} rate limit: {e}")))?;
        }
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = GatherConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.cache_ttl_seconds, 600);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.depth, Depth::Quick);
        assert!(config.user_agent.starts_with("devctx/"));
    }

    #[test]
    fn default_sources_include_all_three() {
        let config = GatherConfig::default();
        assert_eq!(config.sources.len(), 3);
        assert!(config.sources.contains(&Source::GitHub));
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(GatherConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = GatherConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn oversized_max_results_rejected() {
        let config = GatherConfig {
            max_results: MAX_RESULTS_LIMIT + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = GatherConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_sources_rejected() {
        let config = GatherConfig {
            sources: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn empty_endpoint_rejected() {
        let mut config = GatherConfig::default();
        config.endpoints.reddit = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reddit"));
    }

    #[test]
    fn invalid_rate_limit_rejected() {
        let mut config = GatherConfig::default();
        config.rate_limits.github.max_concurrent = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("github rate limit"));
    }

    #[test]
    fn github_is_throttled_harder_than_stackoverflow() {
        let limits = SourceRateLimits::default();
        assert!(limits.github.min_interval_ms > limits.stackoverflow.min_interval_ms);
        assert!(limits.github.requests_per_interval < limits.stackoverflow.requests_per_interval);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: GatherConfig =
            serde_json::from_str(r#"{"max_results": 5, "sources": ["github"]}"#)
                .expect("deserialize");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.sources, vec![Source::GitHub]);
        assert_eq!(config.timeout_seconds, 10);
    }
}
