//! Per-source request throttling with retry on rate-limit responses.
//!
//! Each [`RateLimiter`] guards one source and enforces:
//!
//! - a maximum number of in-flight calls (semaphore),
//! - a minimum spacing between call starts,
//! - a request budget refilled on a fixed interval,
//! - exponential backoff with random jitter when the source answers with
//!   [`SearchError::RateLimited`], up to `max_retries` attempts.
//!
//! Limiters hold only their own state; nothing is shared between sources.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

use crate::error::SearchError;
use crate::types::Source;

/// Throttling and retry settings for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum calls in flight at once.
    pub max_concurrent: usize,
    /// Minimum milliseconds between the start of two calls.
    pub min_interval_ms: u64,
    /// Calls allowed per refill interval.
    pub requests_per_interval: u32,
    /// Length of the budget refill interval in milliseconds.
    pub refill_interval_ms: u64,
    /// Retries after a rate-limit response before giving up.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub base_backoff_ms: u64,
    /// Upper bound of the random jitter added to each backoff.
    pub max_jitter_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            min_interval_ms: 250,
            requests_per_interval: 30,
            refill_interval_ms: 60_000,
            max_retries: 3,
            base_backoff_ms: 500,
            max_jitter_ms: 250,
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_concurrent == 0 {
            return Err(SearchError::Config(
                "max_concurrent must be greater than 0".into(),
            ));
        }
        if self.requests_per_interval == 0 {
            return Err(SearchError::Config(
                "requests_per_interval must be greater than 0".into(),
            ));
        }
        if self.refill_interval_ms == 0 {
            return Err(SearchError::Config(
                "refill_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Backoff before retry number `attempt` (0-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug)]
struct LimiterState {
    last_call_at: Option<Instant>,
    tokens: u32,
    last_refill_at: Instant,
}

/// Throttle for a single source.
#[derive(Debug)]
pub struct RateLimiter {
    source: Source,
    config: RateLimitConfig,
    in_flight: Semaphore,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(source: Source, config: RateLimitConfig) -> Self {
        Self {
            source,
            in_flight: Semaphore::new(config.max_concurrent.max(1)),
            state: Mutex::new(LimiterState {
                last_call_at: None,
                tokens: config.requests_per_interval,
                last_refill_at: Instant::now(),
            }),
            config,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Run `op` under this limiter, retrying on rate-limit errors.
    ///
    /// `op` is called once per attempt. Errors other than
    /// [`SearchError::RateLimited`] are returned immediately. When retries
    /// are exhausted the first rate-limit error is returned.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, SearchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SearchError>>,
    {
        let mut attempt = 0u32;
        let mut first_error: Option<SearchError> = None;

        loop {
            let outcome = {
                let _permit = self.acquire().await?;
                op().await
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limit() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff(attempt) + self.jitter();
                    tracing::warn!(
                        source = %self.source,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited; backing off"
                    );
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_rate_limit() {
                        tracing::warn!(source = %self.source, attempts = attempt + 1, "rate-limit retries exhausted");
                    }
                    return Err(first_error.unwrap_or(err));
                }
            }
        }
    }

    /// Wait for a concurrency slot, the call spacing and the request budget.
    async fn acquire(&self) -> Result<SemaphorePermit<'_>, SearchError> {
        let permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| SearchError::Http(format!("{} limiter closed: {e}", self.source)))?;

        let refill_interval = Duration::from_millis(self.config.refill_interval_ms);
        let min_interval = Duration::from_millis(self.config.min_interval_ms);

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();

                if now.duration_since(state.last_refill_at) >= refill_interval {
                    state.tokens = self.config.requests_per_interval;
                    state.last_refill_at = now;
                }

                let spacing_wait = state
                    .last_call_at
                    .map(|last| min_interval.saturating_sub(now.duration_since(last)))
                    .unwrap_or_default();

                if state.tokens == 0 {
                    refill_interval.saturating_sub(now.duration_since(state.last_refill_at))
                } else if !spacing_wait.is_zero() {
                    spacing_wait
                } else {
                    state.tokens -= 1;
                    state.last_call_at = Some(now);
                    return Ok(permit);
                }
            };

            tracing::trace!(source = %self.source, wait_ms = wait.as_millis() as u64, "throttling source call");
            tokio::time::sleep(wait).await;
        }
    }

    fn jitter(&self) -> Duration {
        if self.config.max_jitter_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(0..=self.config.max_jitter_ms);
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_config() -> RateLimitConfig {
        RateLimitConfig {
            max_concurrent: 4,
            min_interval_ms: 0,
            requests_per_interval: 100,
            refill_interval_ms: 60_000,
            max_retries: 3,
            base_backoff_ms: 1,
            max_jitter_ms: 1,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let config = RateLimitConfig {
            base_backoff_ms: 100,
            ..Default::default()
        };
        assert_eq!(config.backoff(0), Duration::from_millis(100));
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn zero_budget_rejected() {
        let config = RateLimitConfig {
            requests_per_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("requests_per_interval"));
    }

    #[tokio::test]
    async fn success_passes_through() {
        let limiter = RateLimiter::new(Source::GitHub, fast_config());
        let value = limiter.execute(|| async { Ok::<_, SearchError>(7) }).await;
        assert_eq!(value.ok(), Some(7));
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let limiter = RateLimiter::new(Source::Reddit, fast_config());
        let calls = AtomicU32::new(0);
        let value = limiter
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SearchError::RateLimited(format!("attempt {n}")))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(value.ok(), Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_return_original_error() {
        let limiter = RateLimiter::new(Source::StackOverflow, fast_config());
        let calls = AtomicU32::new(0);
        let result: Result<(), SearchError> = limiter
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(SearchError::RateLimited(format!("attempt {n}"))) }
            })
            .await;
        // One initial call plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(result.unwrap_err().to_string(), "rate limited: attempt 0");
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let limiter = RateLimiter::new(Source::GitHub, fast_config());
        let calls = AtomicU32::new(0);
        let result: Result<(), SearchError> = limiter
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SearchError::Http("502".into())) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.unwrap_err().to_string().contains("502"));
    }

    #[tokio::test]
    async fn enforces_minimum_spacing() {
        let config = RateLimitConfig {
            min_interval_ms: 40,
            ..fast_config()
        };
        let limiter = RateLimiter::new(Source::GitHub, config);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.execute(|| async { Ok::<_, SearchError>(()) }).await.ok();
        }
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn waits_for_budget_refill() {
        let config = RateLimitConfig {
            requests_per_interval: 1,
            refill_interval_ms: 60,
            ..fast_config()
        };
        let limiter = RateLimiter::new(Source::Reddit, config);
        let start = Instant::now();
        limiter.execute(|| async { Ok::<_, SearchError>(()) }).await.ok();
        limiter.execute(|| async { Ok::<_, SearchError>(()) }).await.ok();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn caps_in_flight_calls() {
        let config = RateLimitConfig {
            max_concurrent: 2,
            ..fast_config()
        };
        let limiter = Arc::new(RateLimiter::new(Source::StackOverflow, config));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    limiter
                        .execute(|| {
                            let active = Arc::clone(&active);
                            let peak = Arc::clone(&peak);
                            async move {
                                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                                peak.fetch_max(now, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(10)).await;
                                active.fetch_sub(1, Ordering::SeqCst);
                                Ok::<_, SearchError>(())
                            }
                        })
                        .await
                }
            })
            .collect();

        futures::future::join_all(tasks).await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
