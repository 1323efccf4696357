//! Score weight distribution.
//!
//! A single question carrying most of the total weight, or a very wide spread
//! between the lightest and heaviest question, usually means a typo in a
//! weight rather than intent.

use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};

/// Weight distribution analyzer.
#[derive(Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzerTrait for Analyzer {
    type Output = Analysis;

    fn name(&self) -> &'static str {
        "weights"
    }

    fn description(&self) -> &'static str {
        "Flag invalid weights, dominant questions, and extreme weight variance"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let mut analysis = Analysis::default();
        if ctx.scoring().is_none() {
            return analysis;
        }
        let thresholds = &ctx.config.weights;

        let mut weighted: Vec<(&str, f64)> = Vec::new();
        for question in ctx.scorable_questions() {
            if question.has_valid_weight() {
                weighted.push((question.id.as_str(), question.score_weight));
                continue;
            }
            analysis.issues.push(
                ValidationIssue::error(
                    Domain::Scoring,
                    IssueCode::InvalidWeight,
                    format!(
                        "Question \"{}\" has invalid weight {}; weights must be finite and non-negative",
                        question.id, question.score_weight
                    ),
                )
                .with_question(question.id.clone())
                .with_details(json!({ "weight": question.score_weight.to_string() })),
            );
        }

        if weighted.len() < thresholds.min_scorable_questions.max(1) {
            return analysis;
        }

        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        analysis.total_weight = total;
        analysis.stats = Some(WeightStats::from_weights(&weighted));

        if total > 0.0 {
            for (id, weight) in &weighted {
                let share = weight / total;
                if share > thresholds.dominance_ratio {
                    let percentage = round_one(share * 100.0);
                    analysis.dominant.push(DominantQuestion {
                        question_id: id.to_string(),
                        weight: *weight,
                        percentage,
                    });
                    analysis.issues.push(
                        ValidationIssue::warning(
                            Domain::Scoring,
                            IssueCode::WeightImbalance,
                            format!(
                                "Question \"{}\" carries {}% of the total score weight",
                                id, percentage
                            ),
                        )
                        .with_question(id.to_string())
                        .with_details(json!({
                            "weight": weight,
                            "percentage": percentage,
                            "totalWeight": total,
                        })),
                    );
                }
            }
        }

        if let Some(stats) = &analysis.stats {
            if stats.min > 0.0 && stats.max > thresholds.variance_ratio * stats.min {
                analysis.issues.push(
                    ValidationIssue::info(
                        Domain::Scoring,
                        IssueCode::ExtremeWeightVariance,
                        format!(
                            "Weights range from {} to {}, more than {}x apart",
                            stats.min, stats.max, thresholds.variance_ratio
                        ),
                    )
                    .with_question(stats.max_question.clone())
                    .with_details(json!({
                        "min": stats.min,
                        "max": stats.max,
                        "minQuestionId": stats.min_question,
                        "maxQuestionId": stats.max_question,
                        "ratio": thresholds.variance_ratio,
                    })),
                );
            }
        }

        analysis
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Lightest and heaviest weights, first occurrence wins on ties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightStats {
    pub min: f64,
    pub max: f64,
    pub min_question: String,
    pub max_question: String,
}

impl WeightStats {
    fn from_weights(weights: &[(&str, f64)]) -> Self {
        let (first_id, first) = weights[0];
        let mut stats = Self {
            min: first,
            max: first,
            min_question: first_id.to_string(),
            max_question: first_id.to_string(),
        };
        for (id, weight) in &weights[1..] {
            if *weight < stats.min {
                stats.min = *weight;
                stats.min_question = id.to_string();
            }
            if *weight > stats.max {
                stats.max = *weight;
                stats.max_question = id.to_string();
            }
        }
        stats
    }
}

/// A question above the dominance threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DominantQuestion {
    pub question_id: String,
    pub weight: f64,
    pub percentage: f64,
}

/// Result of weight analysis.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub total_weight: f64,
    pub stats: Option<WeightStats>,
    pub dominant: Vec<DominantQuestion>,
    pub issues: Vec<ValidationIssue>,
}
