//! Validation findings shared by every analyzer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Issue severity.
///
/// Only `Error` blocks publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Which part of the survey an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Logic,
    Scoring,
    General,
}

/// Stable issue codes. Serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // General survey shape
    NoQuestions,
    TooManyQuestions,
    DuplicateQuestionIds,
    EmptyQuestionText,
    InvalidQuestionOrder,
    // Logic
    MissingTarget,
    ConflictingRules,
    InvalidCondition,
    ConditionUnknownQuestion,
    EndRuleWithTarget,
    UnreachableQuestion,
    BackwardsJump,
    // Scoring
    NoBandsDefined,
    BandGap,
    BandOverlap,
    InvalidBandRange,
    BandOutOfRange,
    UnusedCategory,
    ScorableNoCategory,
    InvalidCategoryRef,
    MissingOptionScores,
    InvalidWeight,
    WeightImbalance,
    ExtremeWeightVariance,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::NoQuestions => "NO_QUESTIONS",
            IssueCode::TooManyQuestions => "TOO_MANY_QUESTIONS",
            IssueCode::DuplicateQuestionIds => "DUPLICATE_QUESTION_IDS",
            IssueCode::EmptyQuestionText => "EMPTY_QUESTION_TEXT",
            IssueCode::InvalidQuestionOrder => "INVALID_QUESTION_ORDER",
            IssueCode::MissingTarget => "MISSING_TARGET",
            IssueCode::ConflictingRules => "CONFLICTING_RULES",
            IssueCode::InvalidCondition => "INVALID_CONDITION",
            IssueCode::ConditionUnknownQuestion => "CONDITION_UNKNOWN_QUESTION",
            IssueCode::EndRuleWithTarget => "END_RULE_WITH_TARGET",
            IssueCode::UnreachableQuestion => "UNREACHABLE_QUESTION",
            IssueCode::BackwardsJump => "BACKWARDS_JUMP",
            IssueCode::NoBandsDefined => "NO_BANDS_DEFINED",
            IssueCode::BandGap => "BAND_GAP",
            IssueCode::BandOverlap => "BAND_OVERLAP",
            IssueCode::InvalidBandRange => "INVALID_BAND_RANGE",
            IssueCode::BandOutOfRange => "BAND_OUT_OF_RANGE",
            IssueCode::UnusedCategory => "UNUSED_CATEGORY",
            IssueCode::ScorableNoCategory => "SCORABLE_NO_CATEGORY",
            IssueCode::InvalidCategoryRef => "INVALID_CATEGORY_REF",
            IssueCode::MissingOptionScores => "MISSING_OPTION_SCORES",
            IssueCode::InvalidWeight => "INVALID_WEIGHT",
            IssueCode::WeightImbalance => "WEIGHT_IMBALANCE",
            IssueCode::ExtremeWeightVariance => "EXTREME_WEIGHT_VARIANCE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub domain: Domain,
    pub code: IssueCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationIssue {
    pub fn new(
        domain: Domain,
        code: IssueCode,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            code,
            severity,
            message: message.into(),
            question_id: None,
            rule_id: None,
            category_id: None,
            band_id: None,
            details: None,
        }
    }

    pub fn error(domain: Domain, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(domain, code, Severity::Error, message)
    }

    pub fn warning(domain: Domain, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(domain, code, Severity::Warning, message)
    }

    pub fn info(domain: Domain, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(domain, code, Severity::Info, message)
    }

    pub fn with_question(mut self, id: impl Into<String>) -> Self {
        self.question_id = Some(id.into());
        self
    }

    pub fn with_rule(mut self, id: impl Into<String>) -> Self {
        self.rule_id = Some(id.into());
        self
    }

    pub fn with_category(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }

    pub fn with_band(mut self, id: impl Into<String>) -> Self {
        self.band_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the severity, e.g. when a policy escalates a warning.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
