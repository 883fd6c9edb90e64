//! Gather orchestrator: validation, cache, analysis, concurrent source
//! fan-out, ranking and aggregation.
//!
//! A single source failing (network error, exhausted rate-limit retries,
//! timeout) never fails the request. That source contributes zero results
//! and is listed in `stats.incomplete_sources`.

mod gather;

pub use gather::{Gatherer, ResolvedRequest};
