//! Tunable ranking constants.
//!
//! The values are empirical. They are kept as data so they can be
//! overridden from the configuration file without touching the formulas.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::{ProblemCategory, Source};

/// Multipliers for the three 0–100 factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub relevance: f64,
    pub recency: f64,
    pub community: f64,
}

impl FactorWeights {
    pub const fn new(relevance: f64, recency: f64, community: f64) -> Self {
        Self {
            relevance,
            recency,
            community,
        }
    }
}

/// Factor weights for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub category: ProblemCategory,
    #[serde(flatten)]
    pub weights: FactorWeights,
}

/// Accepted-result bonus for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedBonus {
    pub category: ProblemCategory,
    pub bonus: f64,
}

/// Affinity of a source for a category, 0.0–1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAffinity {
    pub category: ProblemCategory,
    pub source: Source,
    pub weight: f64,
}

/// One step of a recency curve: results younger than `max_days` score `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyStep {
    pub max_days: f64,
    pub score: f64,
}

/// Step function from age in days to a 0–100 recency score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyCurve {
    /// Ascending by `max_days`.
    pub steps: Vec<RecencyStep>,
    /// Score for results older than every step.
    pub floor: f64,
}

impl RecencyCurve {
    fn from_pairs(pairs: &[(f64, f64)], floor: f64) -> Self {
        Self {
            steps: pairs
                .iter()
                .map(|&(max_days, score)| RecencyStep { max_days, score })
                .collect(),
            floor,
        }
    }

    /// Score for a result `days` old. Negative ages count as brand new.
    pub fn score(&self, days: f64) -> f64 {
        let days = days.max(0.0);
        self.steps
            .iter()
            .find(|step| days < step.max_days)
            .map_or(self.floor, |step| step.score)
    }
}

/// The three recency curves and which categories use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyConfig {
    /// Bug and compatibility queries.
    pub fast_decay: RecencyCurve,
    /// Best-practice queries.
    pub slow_decay: RecencyCurve,
    /// Every other category, including unknown.
    pub default: RecencyCurve,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            fast_decay: RecencyCurve::from_pairs(
                &[(7.0, 100.0), (30.0, 85.0), (90.0, 60.0), (180.0, 30.0), (365.0, 15.0)],
                5.0,
            ),
            slow_decay: RecencyCurve::from_pairs(
                &[(30.0, 100.0), (90.0, 85.0), (180.0, 70.0), (365.0, 55.0), (1095.0, 40.0)],
                30.0,
            ),
            default: RecencyCurve::from_pairs(
                &[(7.0, 100.0), (30.0, 80.0), (90.0, 60.0), (365.0, 40.0), (730.0, 20.0)],
                10.0,
            ),
        }
    }
}

impl RecencyConfig {
    pub fn curve_for(&self, category: Option<ProblemCategory>) -> &RecencyCurve {
        match category {
            Some(ProblemCategory::Bug | ProblemCategory::Compatibility) => &self.fast_decay,
            Some(ProblemCategory::BestPractice) => &self.slow_decay,
            _ => &self.default,
        }
    }
}

/// Every constant used by [`super::Ranker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Used when the category is unknown or missing from `category_weights`.
    pub default_weights: FactorWeights,
    pub category_weights: Vec<CategoryWeights>,
    /// Bonus for accepted results when the category has no entry.
    pub default_accepted_bonus: f64,
    pub accepted_bonuses: Vec<AcceptedBonus>,
    pub source_affinities: Vec<SourceAffinity>,
    /// Multiplier applied to the 0–100 affinity score.
    pub affinity_weight: f64,
    /// Legacy affinity when the source suits the query shape.
    pub affinity_match: f64,
    /// Legacy affinity otherwise.
    pub affinity_neutral: f64,
    pub recency: RecencyConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        use ProblemCategory::*;
        use Source::*;

        let affinity = |category, source, weight| SourceAffinity {
            category,
            source,
            weight,
        };

        Self {
            default_weights: FactorWeights::new(0.35, 0.25, 0.20),
            category_weights: vec![
                CategoryWeights { category: Configuration, weights: FactorWeights::new(0.35, 0.15, 0.30) },
                CategoryWeights { category: Bug, weights: FactorWeights::new(0.35, 0.30, 0.20) },
                CategoryWeights { category: Performance, weights: FactorWeights::new(0.35, 0.25, 0.25) },
                CategoryWeights { category: Compatibility, weights: FactorWeights::new(0.30, 0.40, 0.15) },
                CategoryWeights { category: BestPractice, weights: FactorWeights::new(0.30, 0.10, 0.40) },
            ],
            default_accepted_bonus: 12.0,
            accepted_bonuses: vec![
                AcceptedBonus { category: Configuration, bonus: 20.0 },
                AcceptedBonus { category: BestPractice, bonus: 20.0 },
                AcceptedBonus { category: Bug, bonus: 15.0 },
            ],
            source_affinities: vec![
                affinity(Configuration, StackOverflow, 0.9),
                affinity(Configuration, GitHub, 0.6),
                affinity(Configuration, Reddit, 0.5),
                affinity(Bug, GitHub, 0.9),
                affinity(Bug, StackOverflow, 0.8),
                affinity(Bug, Reddit, 0.4),
                affinity(Performance, GitHub, 0.8),
                affinity(Performance, StackOverflow, 0.7),
                affinity(Performance, Reddit, 0.6),
                affinity(Compatibility, GitHub, 0.9),
                affinity(Compatibility, StackOverflow, 0.7),
                affinity(Compatibility, Reddit, 0.5),
                affinity(BestPractice, StackOverflow, 0.8),
                affinity(BestPractice, Reddit, 0.8),
                affinity(BestPractice, GitHub, 0.5),
            ],
            affinity_weight: 0.05,
            affinity_match: 100.0,
            affinity_neutral: 50.0,
            recency: RecencyConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Factor weights for `category`, falling back to the defaults.
    pub fn weights_for(&self, category: Option<ProblemCategory>) -> FactorWeights {
        category
            .and_then(|c| self.category_weights.iter().find(|w| w.category == c))
            .map_or(self.default_weights, |w| w.weights)
    }

    /// Accepted bonus for `category`, falling back to the default bonus.
    pub fn accepted_bonus_for(&self, category: Option<ProblemCategory>) -> f64 {
        category
            .and_then(|c| self.accepted_bonuses.iter().find(|b| b.category == c))
            .map_or(self.default_accepted_bonus, |b| b.bonus)
    }

    /// Table affinity for the pair, if the table has one.
    pub fn affinity_for(&self, category: Option<ProblemCategory>, source: Source) -> Option<f64> {
        let category = category?;
        self.source_affinities
            .iter()
            .find(|a| a.category == category && a.source == source)
            .map(|a| a.weight)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        let weight_sets = std::iter::once(&self.default_weights)
            .chain(self.category_weights.iter().map(|w| &w.weights));
        for w in weight_sets {
            for value in [w.relevance, w.recency, w.community] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SearchError::Config(
                        "scoring weights must be finite and non-negative".into(),
                    ));
                }
            }
        }
        for a in &self.source_affinities {
            if !(0.0..=1.0).contains(&a.weight) {
                return Err(SearchError::Config(format!(
                    "source affinity for {}/{} must be within 0.0..=1.0",
                    a.category, a.source
                )));
            }
        }
        for curve in [
            &self.recency.fast_decay,
            &self.recency.slow_decay,
            &self.recency.default,
        ] {
            if curve
                .steps
                .windows(2)
                .any(|pair| pair[0].max_days >= pair[1].max_days)
            {
                return Err(SearchError::Config(
                    "recency steps must be strictly ascending by max_days".into(),
                ));
            }
        }
        Ok(())
    }
}
