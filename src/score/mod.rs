//! Score computation engine.
//!
//! Turns one respondent's answers into weighted per-question contributions,
//! per-category normalized scores matched against bands, and an overall score
//! under the configured rollup policy.

mod rollup;
mod trace;

use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::Config;
use crate::core::{DiagnosticEvent, DiagnosticObserver, NoopObserver};
use crate::model::{AnswerSet, AnswerValue, Question, ScoreConfig};

pub use rollup::RollupPolicy;
pub use trace::{
    CategoryBreakdown, ContributionStatus, MatchedBand, OverallScore, QuestionContribution,
    ScoreTrace, TraceConfig, TraceError, TraceErrorCode, TraceMeta,
};

/// Compute a score trace with the default rollup policy and no observer.
pub fn compute_score_trace(
    questions: &[Question],
    config: &ScoreConfig,
    answers: &AnswerSet,
) -> ScoreTrace {
    ScoreEngine::default().compute(questions, config, answers, &NoopObserver)
}

/// `round(100 * raw / max)` clamped to 0..=100; 0 when nothing is attainable.
pub fn normalize_score(raw: f64, max: f64) -> u32 {
    if max.is_nan() || max <= 0.0 || !raw.is_finite() || !max.is_finite() {
        return 0;
    }
    (100.0 * raw / max).round().clamp(0.0, 100.0) as u32
}

/// Score computation engine.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    rollup: RollupPolicy,
}

impl ScoreEngine {
    pub fn new(rollup: RollupPolicy) -> Self {
        Self { rollup }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scoring.rollup)
    }

    pub fn rollup(&self) -> RollupPolicy {
        self.rollup
    }

    pub fn compute(
        &self,
        questions: &[Question],
        config: &ScoreConfig,
        answers: &AnswerSet,
        observer: &dyn DiagnosticObserver,
    ) -> ScoreTrace {
        let start = Instant::now();
        let mut errors = Vec::new();

        let meta = TraceMeta {
            question_count: questions.len(),
            scorable_count: questions.iter().filter(|q| q.scorable).count(),
            answered_count: questions
                .iter()
                .filter(|q| answer_for(q, answers).is_some())
                .count(),
        };
        let trace_config = TraceConfig {
            enabled: config.enabled,
            category_count: config.categories.len(),
            band_count: config.score_ranges.len(),
            rollup: self.rollup,
        };

        if !config.enabled {
            errors.push(TraceError::new(
                TraceErrorCode::ScoringDisabled,
                "Scoring is not enabled for this survey",
            ));
            return ScoreTrace {
                meta,
                config: trace_config,
                questions: Vec::new(),
                categories: Vec::new(),
                overall: OverallScore {
                    rule: self.rollup,
                    score: None,
                    band: None,
                },
                errors,
            };
        }

        let contributions: Vec<QuestionContribution> = questions
            .iter()
            .filter(|q| q.scorable)
            .map(|q| score_question(q, config, answers, &mut errors))
            .collect();

        let known: BTreeSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        for question_id in answers.keys() {
            if known.contains(question_id.as_str()) {
                continue;
            }
            observer.observe(&DiagnosticEvent::UnknownAnsweredQuestion {
                question_id: question_id.clone(),
            });
            errors.push(
                TraceError::new(
                    TraceErrorCode::UnknownAnswerQuestion,
                    format!("Answer supplied for unknown question \"{}\"", question_id),
                )
                .with_question(question_id.clone()),
            );
        }

        let categories: Vec<CategoryBreakdown> = config
            .categories
            .iter()
            .map(|category| {
                let members: Vec<&QuestionContribution> = contributions
                    .iter()
                    .filter(|c| c.category_id.as_deref() == Some(category.id.as_str()))
                    .filter(|c| c.status != ContributionStatus::InvalidWeight)
                    .collect();
                let raw_score: f64 = members.iter().map(|c| c.contribution).sum();
                let max_possible_score: f64 = members.iter().map(|c| c.max_contribution).sum();
                if max_possible_score <= 0.0 {
                    observer.observe(&DiagnosticEvent::ZeroMaxPossible {
                        category_id: category.id.clone(),
                    });
                }
                let normalized_score = normalize_score(raw_score, max_possible_score);

                let band = config.match_band(i64::from(normalized_score)).map(MatchedBand::from);
                if band.is_none() {
                    observer.observe(&DiagnosticEvent::NoBandMatch {
                        category_id: category.id.clone(),
                        score: normalized_score,
                    });
                    errors.push(
                        TraceError::new(
                            TraceErrorCode::NoBandMatch,
                            format!(
                                "Category \"{}\" score {} matches no band",
                                category.id, normalized_score
                            ),
                        )
                        .with_category(category.id.clone()),
                    );
                }

                CategoryBreakdown {
                    category_id: category.id.clone(),
                    name: category.name.clone(),
                    question_ids: members.iter().map(|c| c.question_id.clone()).collect(),
                    raw_score,
                    max_possible_score,
                    normalized_score,
                    band,
                }
            })
            .collect();

        let score = self.rollup.apply(&categories, &contributions);
        let band = score.and_then(|s| config.match_band(i64::from(s)).map(MatchedBand::from));
        if let (Some(score), None) = (score, &band) {
            errors.push(TraceError::new(
                TraceErrorCode::NoBandMatch,
                format!("Overall score {} matches no band", score),
            ));
        }

        tracing::debug!(
            scorable = meta.scorable_count,
            answered = meta.answered_count,
            categories = categories.len(),
            errors = errors.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "score trace computed"
        );

        ScoreTrace {
            meta,
            config: trace_config,
            questions: contributions,
            categories,
            overall: OverallScore {
                rule: self.rollup,
                score,
                band,
            },
            errors,
        }
    }
}

fn answer_for<'a>(question: &Question, answers: &'a AnswerSet) -> Option<&'a AnswerValue> {
    answers.get(&question.id).filter(|a| !a.is_blank())
}

fn score_question(
    question: &Question,
    config: &ScoreConfig,
    answers: &AnswerSet,
    errors: &mut Vec<TraceError>,
) -> QuestionContribution {
    let category_id = question
        .scoring_category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string);
    if let Some(category) = &category_id {
        if !config.categories.is_empty() && !config.has_category(category) {
            errors.push(
                TraceError::new(
                    TraceErrorCode::UnknownCategory,
                    format!(
                        "Question \"{}\" references unknown category \"{}\"",
                        question.id, category
                    ),
                )
                .with_question(question.id.clone())
                .with_category(category.clone()),
            );
        }
    }

    let answer = answer_for(question, answers);
    let max_score = max_score(question);
    let mut contribution = QuestionContribution {
        question_id: question.id.clone(),
        category_id,
        status: ContributionStatus::Unanswered,
        answer: answer.cloned(),
        selected_score: 0.0,
        max_score,
        weight: question.score_weight,
        reversed: question.reverse_scored,
        contribution: 0.0,
        max_contribution: 0.0,
    };

    if !question.has_valid_weight() {
        contribution.status = ContributionStatus::InvalidWeight;
        errors.push(
            TraceError::new(
                TraceErrorCode::InvalidWeight,
                format!(
                    "Question \"{}\" has invalid weight {}",
                    question.id, question.score_weight
                ),
            )
            .with_question(question.id.clone()),
        );
        return contribution;
    }

    if let Some(answer) = answer {
        match selected_score(question, answer) {
            Some(score) => {
                contribution.status = ContributionStatus::Answered;
                contribution.selected_score = if question.reverse_scored {
                    (max_score - score).max(0.0)
                } else {
                    score
                };
            }
            None => contribution.status = ContributionStatus::Unmapped,
        }
    }

    contribution.contribution = contribution.selected_score * question.score_weight;
    contribution.max_contribution = max_score * question.score_weight;
    contribution
}

/// Highest score an answer to this question can earn, before weighting.
fn max_score(question: &Question) -> f64 {
    if question.question_type.is_multi_select() {
        return question
            .option_scores
            .values()
            .filter(|s| s.is_finite() && **s > 0.0)
            .sum();
    }
    if let Some((min, max)) = scale_range(question) {
        return max - min;
    }
    question.max_option_score()
}

/// `[minValue, maxValue]` for a numeric scale scored by position rather than
/// option scores. A missing `minValue` means 0.
fn scale_range(question: &Question) -> Option<(f64, f64)> {
    if !question.option_scores.is_empty() || !question.question_type.is_numeric_scale() {
        return None;
    }
    let max = question.max_value.filter(|m| m.is_finite())?;
    let min = question
        .min_value
        .filter(|m| m.is_finite())
        .unwrap_or(0.0)
        .min(max);
    Some((min, max))
}

/// Score of the chosen option(s), or `None` when nothing maps.
fn selected_score(question: &Question, answer: &AnswerValue) -> Option<f64> {
    let lookup = |key: &str| {
        question
            .option_scores
            .get(key)
            .or_else(|| question.option_scores.get(key.trim()))
            .copied()
            .filter(|s| s.is_finite())
    };

    if let AnswerValue::Many(items) = answer {
        let picked: Vec<f64> = items.iter().filter_map(|item| lookup(item.as_str())).collect();
        if picked.is_empty() {
            return None;
        }
        let sum: f64 = picked.iter().sum();
        // Single-select questions answered with a list take the first mapped option.
        return Some(if question.question_type.is_multi_select() {
            sum
        } else {
            picked[0]
        });
    }

    if let Some(score) = answer.option_keys().iter().find_map(|key| lookup(key.as_str())) {
        return Some(score);
    }

    let (min, max) = scale_range(question)?;
    answer.as_number().map(|value| value.clamp(min, max) - min)
}
