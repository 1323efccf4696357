//! Overall score rollup policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::normalize_score;
use super::trace::{CategoryBreakdown, ContributionStatus, QuestionContribution};

/// How per-category scores combine into one overall score.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RollupPolicy {
    /// Report categories only; there is no overall score.
    #[default]
    CategoryOnly,
    /// Unweighted mean of the normalized scores of categories with attainable points.
    MeanOfCategories,
    /// All weighted contributions over all attainable points.
    TotalRatio,
}

impl RollupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollupPolicy::CategoryOnly => "category-only",
            RollupPolicy::MeanOfCategories => "mean-of-categories",
            RollupPolicy::TotalRatio => "total-ratio",
        }
    }

    /// Overall normalized score, or `None` when the policy yields nothing.
    pub fn apply(
        &self,
        categories: &[CategoryBreakdown],
        questions: &[QuestionContribution],
    ) -> Option<u32> {
        match self {
            RollupPolicy::CategoryOnly => None,
            RollupPolicy::MeanOfCategories => {
                let scored: Vec<u32> = categories
                    .iter()
                    .filter(|c| c.max_possible_score > 0.0)
                    .map(|c| c.normalized_score)
                    .collect();
                if scored.is_empty() {
                    return None;
                }
                let sum: u32 = scored.iter().sum();
                let mean = f64::from(sum) / scored.len() as f64;
                Some(mean.round().clamp(0.0, 100.0) as u32)
            }
            RollupPolicy::TotalRatio => {
                let counted = questions
                    .iter()
                    .filter(|q| q.status != ContributionStatus::InvalidWeight);
                let (raw, max) = counted.fold((0.0, 0.0), |(raw, max), q| {
                    (raw + q.contribution, max + q.max_contribution)
                });
                if max > 0.0 {
                    Some(normalize_score(raw, max))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for RollupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "category-only" | "none" => Ok(RollupPolicy::CategoryOnly),
            "mean-of-categories" | "mean" => Ok(RollupPolicy::MeanOfCategories),
            "total-ratio" | "total" => Ok(RollupPolicy::TotalRatio),
            _ => Err(format!("Unknown rollup policy: {}", s)),
        }
    }
}
