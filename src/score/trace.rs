//! Score trace types.

use std::fmt;

use serde::Serialize;

use super::RollupPolicy;
use crate::model::{AnswerValue, ScoreBandView};

/// Itemized score computation for one respondent.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreTrace {
    pub meta: TraceMeta,
    pub config: TraceConfig,
    pub questions: Vec<QuestionContribution>,
    pub categories: Vec<CategoryBreakdown>,
    pub overall: OverallScore,
    pub errors: Vec<TraceError>,
}

impl ScoreTrace {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn category(&self, id: &str) -> Option<&CategoryBreakdown> {
        self.categories.iter().find(|c| c.category_id == id)
    }

    pub fn question(&self, id: &str) -> Option<&QuestionContribution> {
        self.questions.iter().find(|q| q.question_id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMeta {
    pub question_count: usize,
    pub scorable_count: usize,
    pub answered_count: usize,
}

/// Echo of the scoring setup the trace was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceConfig {
    pub enabled: bool,
    pub category_count: usize,
    pub band_count: usize,
    pub rollup: RollupPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Answered,
    Unanswered,
    /// Answered, but the answer maps to no configured score.
    Unmapped,
    /// Weight is negative or non-finite; the question is left out of all totals.
    InvalidWeight,
}

/// One scorable question's share of the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContribution {
    pub question_id: String,
    pub category_id: Option<String>,
    pub status: ContributionStatus,
    pub answer: Option<AnswerValue>,
    /// Option score after reverse scoring, before weighting.
    pub selected_score: f64,
    pub max_score: f64,
    pub weight: f64,
    pub reversed: bool,
    pub contribution: f64,
    pub max_contribution: f64,
}

/// Per-category aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: String,
    pub name: String,
    pub question_ids: Vec<String>,
    pub raw_score: f64,
    pub max_possible_score: f64,
    /// 0-100, forced to 0 when nothing is attainable.
    pub normalized_score: u32,
    pub band: Option<MatchedBand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedBand {
    pub id: String,
    pub label: String,
    pub min: i32,
    pub max: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&ScoreBandView> for MatchedBand {
    fn from(view: &ScoreBandView) -> Self {
        Self {
            id: view.band.id.clone(),
            label: view.band.label.clone(),
            min: view.band.min,
            max: view.band.max,
            color: view.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallScore {
    /// Rollup policy that produced `score`.
    pub rule: RollupPolicy,
    pub score: Option<u32>,
    pub band: Option<MatchedBand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceErrorCode {
    ScoringDisabled,
    NoBandMatch,
    UnknownCategory,
    UnknownAnswerQuestion,
    InvalidWeight,
}

impl TraceErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceErrorCode::ScoringDisabled => "SCORING_DISABLED",
            TraceErrorCode::NoBandMatch => "NO_BAND_MATCH",
            TraceErrorCode::UnknownCategory => "UNKNOWN_CATEGORY",
            TraceErrorCode::UnknownAnswerQuestion => "UNKNOWN_ANSWER_QUESTION",
            TraceErrorCode::InvalidWeight => "INVALID_WEIGHT",
        }
    }
}

impl fmt::Display for TraceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine-level problem found while computing a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceError {
    pub code: TraceErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl TraceError {
    pub fn new(code: TraceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            question_id: None,
            category_id: None,
        }
    }

    pub fn with_question(mut self, id: impl Into<String>) -> Self {
        self.question_id = Some(id.into());
        self
    }

    pub fn with_category(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }
}
