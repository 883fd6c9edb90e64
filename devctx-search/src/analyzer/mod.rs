//! Query understanding: problem classification, technology and version
//! extraction, specificity, and per-source strategy derivation.
//!
//! [`QueryAnalyzer::new`] compiles every pattern table once. After that
//! [`QueryAnalyzer::analyze`] is a pure function of the query text and is
//! safe to call concurrently from independent requests.

pub mod patterns;
pub mod strategy;

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ProblemCategory, Source};

pub use strategy::{derive_strategies, SearchStrategy};

/// How narrowly a query pins down its problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Specificity {
    Generic,
    Specific,
    EdgeCase,
}

/// Everything derived from one query. Computed once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub query: String,
    pub category: ProblemCategory,
    pub technologies: BTreeSet<String>,
    pub versions: BTreeSet<String>,
    pub error_keywords: BTreeSet<String>,
    pub specificity: Specificity,
    pub strategies: BTreeMap<Source, SearchStrategy>,
}

impl QueryAnalysis {
    /// Strategy for `source`; an empty strategy when none was derived.
    pub fn strategy_for(&self, source: Source) -> SearchStrategy {
        self.strategies.get(&source).cloned().unwrap_or_default()
    }
}

/// Classifier with precompiled pattern tables.
#[derive(Debug)]
pub struct QueryAnalyzer {
    category_signals: Vec<(ProblemCategory, Vec<Regex>)>,
    performance_boost: Option<Regex>,
    configuration_boost: Option<Regex>,
    error_keywords: Option<Regex>,
    version_patterns: Vec<Regex>,
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryAnalyzer {
    /// Compile the static pattern tables.
    ///
    /// A pattern that fails to compile is dropped with a warning and simply
    /// never matches.
    pub fn new() -> Self {
        let category_signals = patterns::CATEGORY_SIGNALS
            .iter()
            .map(|(category, signals)| {
                (
                    *category,
                    signals.iter().filter_map(|p| compile(p)).collect(),
                )
            })
            .collect();

        Self {
            category_signals,
            performance_boost: compile(patterns::PERFORMANCE_BOOST),
            configuration_boost: compile(patterns::CONFIGURATION_BOOST),
            error_keywords: compile(patterns::ERROR_KEYWORDS),
            version_patterns: patterns::VERSION_PATTERNS
                .iter()
                .filter_map(|p| compile(p))
                .collect(),
        }
    }

    /// Analyze a raw query.
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let category = self.classify(query);
        let technologies = detect_technologies(query);
        let versions = self.extract_versions(query);
        let error_keywords = self.extract_error_keywords(query);
        let specificity = assess_specificity(query, technologies.len(), versions.len());
        let strategies = derive_strategies(query, category, &technologies, &versions);

        tracing::trace!(
            query,
            %category,
            technologies = technologies.len(),
            versions = versions.len(),
            ?specificity,
            "query analyzed"
        );

        QueryAnalysis {
            query: query.to_owned(),
            category,
            technologies,
            versions,
            error_keywords,
            specificity,
            strategies,
        }
    }

    /// Classify `query` into a problem category.
    ///
    /// Each category scores one point per signal occurrence. Performance
    /// gains +2 and configuration +1 when their broader vocabularies also
    /// match. The strictly highest score wins; ties go to the earliest
    /// category in [`ProblemCategory::EVALUATION_ORDER`].
    pub fn classify(&self, query: &str) -> ProblemCategory {
        let mut best = ProblemCategory::Unknown;
        let mut best_score = 0usize;

        for (category, signals) in &self.category_signals {
            let mut score: usize = signals.iter().map(|re| re.find_iter(query).count()).sum();

            if score > 0 {
                let boost = match category {
                    ProblemCategory::Performance => self
                        .performance_boost
                        .as_ref()
                        .filter(|re| re.is_match(query))
                        .map_or(0, |_| 2),
                    ProblemCategory::Configuration => self
                        .configuration_boost
                        .as_ref()
                        .filter(|re| re.is_match(query))
                        .map_or(0, |_| 1),
                    _ => 0,
                };
                score += boost;
            }

            if score > best_score {
                best = *category;
                best_score = score;
            }
        }

        best
    }

    fn extract_versions(&self, query: &str) -> BTreeSet<String> {
        let mut versions = BTreeSet::new();
        for re in &self.version_patterns {
            for caps in re.captures_iter(query) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    versions.insert(m.as_str().to_owned());
                }
            }
        }
        versions
    }

    fn extract_error_keywords(&self, query: &str) -> BTreeSet<String> {
        self.error_keywords
            .as_ref()
            .map(|re| {
                re.find_iter(query)
                    .map(|m| m.as_str().to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Canonical names of every technology with an alias in `query`.
pub fn detect_technologies(query: &str) -> BTreeSet<String> {
    let lower = query.to_lowercase();
    patterns::TECHNOLOGIES
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|alias| lower.contains(alias)))
        .map(|(name, _)| (*name).to_owned())
        .collect()
}

/// Generic is checked first, then edge-case, then specific.
pub fn assess_specificity(query: &str, technologies: usize, versions: usize) -> Specificity {
    let words = query.split_whitespace().count();
    if words < 4 && technologies <= 1 {
        Specificity::Generic
    } else if technologies >= 2 || versions >= 1 || words > 8 {
        Specificity::EdgeCase
    } else {
        Specificity::Specific
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, pattern, "query pattern failed to compile; skipping");
            None
        }
    }
}
