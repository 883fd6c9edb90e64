//! Cross-source relevance ranking.
//!
//! Source-native scores (votes, reactions, upvotes) are not comparable, so
//! every result is first reduced to bounded 0–100 factors and only those
//! are combined:
//!
//! ```text
//! final = relevance * Wr + recency * Wrec + community * Wc
//!       + accepted_bonus + source_affinity * 0.05
//! ```
//!
//! `(Wr, Wrec, Wc)` and every other constant come from [`ScoringConfig`].

pub mod weights;

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::{NormalizedResult, ProblemCategory, RankedResult, Source};

pub use weights::{
    AcceptedBonus, CategoryWeights, FactorWeights, RecencyConfig, RecencyCurve, RecencyStep,
    ScoringConfig, SourceAffinity,
};

const SCORE_CAP: f64 = 100.0;
const TITLE_WORD_POINTS: f64 = 10.0;
const CONTENT_WORD_POINTS: f64 = 2.0;
const EXACT_TITLE_POINTS: f64 = 20.0;
const TAG_POINTS: f64 = 5.0;
const VOTE_CAP: f64 = 50.0;
const NATIVE_SCORE_CAP: f64 = 25.0;
const ACCEPTED_COMMUNITY_POINTS: f64 = 25.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Stateless ranker over an immutable [`ScoringConfig`].
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: ScoringConfig,
}

impl Ranker {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank `results` against `query` using the current time.
    ///
    /// Returns every input exactly once, sorted by descending final score.
    /// Equal scores keep their input order.
    pub fn rank(
        &self,
        query: &str,
        category: Option<ProblemCategory>,
        results: Vec<NormalizedResult>,
    ) -> Vec<RankedResult> {
        self.rank_at(query, category, results, Utc::now())
    }

    /// [`Ranker::rank`] with an explicit clock.
    pub fn rank_at(
        &self,
        query: &str,
        category: Option<ProblemCategory>,
        results: Vec<NormalizedResult>,
        now: DateTime<Utc>,
    ) -> Vec<RankedResult> {
        let weights = self.config.weights_for(category);
        let curve = self.config.recency.curve_for(category);
        let accepted_bonus = self.config.accepted_bonus_for(category);

        let mut ranked: Vec<RankedResult> = results
            .into_iter()
            .map(|result| {
                let relevance_score = relevance_score(query, &result);
                let recency_score = curve.score(age_in_days(&result, now));
                let community_score = community_score(&result);
                let affinity = self.source_affinity(query, category, result.source);
                let bonus = if result.accepted() { accepted_bonus } else { 0.0 };

                let final_score = relevance_score * weights.relevance
                    + recency_score * weights.recency
                    + community_score * weights.community
                    + bonus
                    + affinity * self.config.affinity_weight;

                RankedResult {
                    result,
                    relevance_score,
                    recency_score,
                    community_score,
                    final_score,
                }
            })
            .collect();

        // `sort_by` is stable, so ties keep input order.
        ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        tracing::debug!(
            count = ranked.len(),
            category = category.map(|c| c.id()).unwrap_or("none"),
            top = ranked.first().map(|r| r.final_score).unwrap_or_default(),
            "results ranked"
        );

        ranked
    }

    /// 0–100 affinity of `source` for this query.
    ///
    /// Uses the category table when it has an entry, otherwise a legacy
    /// heuristic: Stack Overflow suits how-to questions, GitHub suits bug
    /// reports.
    pub fn source_affinity(
        &self,
        query: &str,
        category: Option<ProblemCategory>,
        source: Source,
    ) -> f64 {
        if let Some(weight) = self.config.affinity_for(category, source) {
            return weight * 100.0;
        }
        let suited = match source {
            Source::StackOverflow => looks_like_how_to(query),
            Source::GitHub => looks_like_bug_report(query),
            Source::Reddit => false,
        };
        if suited {
            self.config.affinity_match
        } else {
            self.config.affinity_neutral
        }
    }
}

/// 0–100 lexical relevance of `result` to `query`.
///
/// Per query word: +10 when in the title, +2 when in the body. +20 when the
/// whole query appears in the title. +5 per tag that contains, or is
/// contained in, the query.
pub fn relevance_score(query: &str, result: &NormalizedResult) -> f64 {
    let query_lower = query.trim().to_lowercase();
    let title = result.title.to_lowercase();
    let content = result.content.to_lowercase();

    let mut score = 0.0;
    for word in query_lower.split_whitespace() {
        if title.contains(word) {
            score += TITLE_WORD_POINTS;
        }
        if content.contains(word) {
            score += CONTENT_WORD_POINTS;
        }
    }

    if !query_lower.is_empty() && title.contains(&query_lower) {
        score += EXACT_TITLE_POINTS;
    }

    for tag in &result.tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || query_lower.is_empty() {
            continue;
        }
        if query_lower.contains(&tag) || tag.contains(&query_lower) {
            score += TAG_POINTS;
        }
    }

    f64::min(score, SCORE_CAP)
}

/// 0–100 normalised community signal.
///
/// `min(votes, 50) + min(native / 2, 25) + 25 if accepted`, capped at 100.
/// Negative votes and scores contribute nothing.
pub fn community_score(result: &NormalizedResult) -> f64 {
    let votes = result.vote_count.unwrap_or(0).max(0) as f64;
    let native = result.score.max(0) as f64;
    let accepted = if result.accepted() {
        ACCEPTED_COMMUNITY_POINTS
    } else {
        0.0
    };
    let score = f64::min(votes, VOTE_CAP) + f64::min(native / 2.0, NATIVE_SCORE_CAP) + accepted;
    f64::min(score, SCORE_CAP)
}

/// Days between the result's last activity and `now`.
fn age_in_days(result: &NormalizedResult, now: DateTime<Utc>) -> f64 {
    let seconds = now.signed_duration_since(result.last_activity()).num_seconds();
    seconds as f64 / SECONDS_PER_DAY
}

fn looks_like_how_to(query: &str) -> bool {
    static HOW_TO: OnceLock<Option<Regex>> = OnceLock::new();
    HOW_TO
        .get_or_init(|| {
            Regex::new(r"(?i)^\s*(how|what|why|when|where|which|can|is)\b|\bhow (to|do|can|should)\b")
                .ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(query))
}

fn looks_like_bug_report(query: &str) -> bool {
    static BUG_REPORT: OnceLock<Option<Regex>> = OnceLock::new();
    BUG_REPORT
        .get_or_init(|| {
            Regex::new(r"(?i)\b(error|bug|crash\w*|fail\w*|exception|broken|regression|not working|[a-z]+error)\b")
                .ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(query))
}
