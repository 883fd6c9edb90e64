//! Core types shared by the analyzer, ranker, aggregator and adapters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// External content providers that devctx can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Stack Overflow, the Q&A source.
    StackOverflow,
    /// GitHub issues.
    GitHub,
    /// Reddit discussion threads.
    Reddit,
}

impl Source {
    /// Wire identifier used in requests, responses and cache keys.
    pub fn id(&self) -> &'static str {
        match self {
            Self::StackOverflow => "stackoverflow",
            Self::GitHub => "github",
            Self::Reddit => "reddit",
        }
    }

    /// Human-readable name used in summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StackOverflow => "Stack Overflow",
            Self::GitHub => "GitHub",
            Self::Reddit => "Reddit",
        }
    }

    /// Returns all sources in their fixed order.
    pub fn all() -> &'static [Source] {
        &[Self::StackOverflow, Self::GitHub, Self::Reddit]
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stackoverflow" => Ok(Self::StackOverflow),
            "github" => Ok(Self::GitHub),
            "reddit" => Ok(Self::Reddit),
            other => Err(SearchError::InvalidRequest(format!(
                "unknown source '{other}' (expected stackoverflow, github or reddit)"
            ))),
        }
    }
}

/// Classified problem type of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemCategory {
    Configuration,
    Bug,
    Performance,
    Compatibility,
    BestPractice,
    Unknown,
}

impl ProblemCategory {
    /// Order in which categories are scored. On a tie at the highest
    /// non-zero score the earliest entry wins.
    pub const EVALUATION_ORDER: [ProblemCategory; 5] = [
        Self::Configuration,
        Self::Bug,
        Self::Performance,
        Self::Compatibility,
        Self::BestPractice,
    ];

    /// Wire identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Bug => "bug",
            Self::Performance => "performance",
            Self::Compatibility => "compatibility",
            Self::BestPractice => "best-practice",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProblemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// How much effort a gather request should spend per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    #[default]
    Quick,
    Thorough,
}

impl Depth {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Thorough => "thorough",
        }
    }
}

impl FromStr for Depth {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "thorough" => Ok(Self::Thorough),
            other => Err(SearchError::InvalidRequest(format!(
                "unknown depth '{other}' (expected quick or thorough)"
            ))),
        }
    }
}

/// A fenced or `<pre>` code block lifted out of a result body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    /// Language tag, empty when the block was untagged.
    pub language: String,
    pub code: String,
}

/// A source-agnostic record produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub title: String,
    /// Canonical URL of the post, issue or thread.
    pub url: String,
    pub source: Source,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Source-native score (votes, reactions, upvotes). Not comparable
    /// across sources.
    pub score: i64,
    /// Plain-text or Markdown body. Empty when the source had none.
    pub content: String,
    pub code_snippets: Vec<CodeSnippet>,
    pub tags: Vec<String>,
    pub version: Option<String>,
    /// Accepted answer, closed issue or resolved thread.
    pub is_accepted: Option<bool>,
    pub vote_count: Option<i64>,
}

impl NormalizedResult {
    /// The later of creation and last-update time.
    pub fn last_activity(&self) -> DateTime<Utc> {
        match self.updated_at {
            Some(updated) if updated > self.created_at => updated,
            _ => self.created_at,
        }
    }

    pub fn accepted(&self) -> bool {
        self.is_accepted.unwrap_or(false)
    }
}

/// A normalized result with its ranking scores attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    #[serde(flatten)]
    pub result: NormalizedResult,
    /// 0–100.
    pub relevance_score: f64,
    /// 0–100.
    pub recency_score: f64,
    /// 0–100.
    pub community_score: f64,
    /// Unbounded weighted sum of the factors above plus bonuses.
    pub final_score: f64,
}

/// A user-facing reference to one ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub source: Source,
    pub author: String,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    /// Rounded final score.
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub snippet: String,
}

/// A deduplicated code excerpt with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedSnippet {
    pub language: String,
    pub code: String,
    pub source: Source,
    pub url: String,
}

/// Timing and provenance counters for one gather call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherStats {
    pub elapsed_ms: u64,
    pub source_counts: BTreeMap<Source, usize>,
    pub cache_hits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete_sources: Option<Vec<Source>>,
}

/// The terminal bundle returned to the tool caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherContextResult {
    pub summary: String,
    pub highlights: Vec<String>,
    pub citations: Vec<Citation>,
    pub snippets: Vec<CollectedSnippet>,
    pub stats: GatherStats,
}

/// A gather request as received from the tool surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherRequest {
    pub query: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub depth: Option<Depth>,
}

impl GatherRequest {
    /// A request for `query` using configured defaults for everything else.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sources: None,
            max_results: None,
            depth: None,
        }
    }
}
