//! Survey data model: questions, logic rules, scoring configuration, answers.
//!
//! These are snapshots owned by the survey builder. The engine only reads them.

pub mod condition;
mod document;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use condition::{Condition, ConditionValue, Operator, ParseError};
pub use document::{load_document, AnswerSet, SurveyDocument};

use condition::format_number;

/// Target id used by edges that terminate the survey.
pub const END_SENTINEL: &str = "__END__";

/// Lowest value a band may start at.
pub const SCORE_MIN: i32 = 0;
/// Highest value a band may end at.
pub const SCORE_MAX: i32 = 100;

/// Kind of question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[serde(alias = "multiple-choice")]
    MultipleChoice,
    Checkbox,
    Dropdown,
    #[serde(alias = "yes-no", alias = "yesno")]
    YesNo,
    #[default]
    #[serde(alias = "short-text", alias = "text")]
    ShortText,
    #[serde(alias = "long-text", alias = "textarea")]
    LongText,
    Email,
    Phone,
    Url,
    Number,
    Date,
    Time,
    Rating,
    Scale,
    Nps,
    Slider,
    Likert,
    Matrix,
    Ranking,
    #[serde(alias = "image-choice")]
    ImageChoice,
    #[serde(alias = "file-upload")]
    FileUpload,
    Signature,
    Address,
    Consent,
    Statement,
}

impl QuestionType {
    /// Types whose answers are picked from `options` and so need option scores.
    pub fn is_choice_like(&self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice
                | QuestionType::Dropdown
                | QuestionType::YesNo
                | QuestionType::Checkbox
        )
    }

    /// Types answered with a number on a bounded scale.
    pub fn is_numeric_scale(&self) -> bool {
        matches!(
            self,
            QuestionType::Rating
                | QuestionType::Scale
                | QuestionType::Nps
                | QuestionType::Slider
                | QuestionType::Number
        )
    }

    /// Types that accept several selections in one answer.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, QuestionType::Checkbox)
    }
}

/// What a logic rule does when its condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Skip,
    Show,
    End,
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleAction::Skip => "skip",
            RuleAction::Show => "show",
            RuleAction::End => "end",
        };
        f.write_str(s)
    }
}

/// Persisted shape of a logic rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_question_id: Option<String>,
}

impl LogicRule {
    fn build(
        id: impl Into<String>,
        condition: Option<&str>,
        action: RuleAction,
        target: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            condition: condition.map(str::to_string),
            action,
            target_question_id: target.map(str::to_string),
        }
    }

    pub fn skip(id: impl Into<String>, condition: Option<&str>, target: &str) -> Self {
        Self::build(id, condition, RuleAction::Skip, Some(target))
    }

    pub fn show(id: impl Into<String>, condition: Option<&str>, target: &str) -> Self {
        Self::build(id, condition, RuleAction::Show, Some(target))
    }

    pub fn end(id: impl Into<String>, condition: Option<&str>) -> Self {
        Self::build(id, condition, RuleAction::End, None)
    }

    /// True when the rule fires regardless of answers.
    pub fn is_unconditional(&self) -> bool {
        self.condition
            .as_deref()
            .map(|c| c.trim().is_empty())
            .unwrap_or(true)
    }

    /// Parse the condition. `None` for unconditional rules.
    pub fn parsed_condition(&self) -> Option<Result<Condition, ParseError>> {
        if self.is_unconditional() {
            return None;
        }
        self.condition.as_deref().map(Condition::parse)
    }

    /// Where the rule sends the respondent; end rules resolve to [`END_SENTINEL`].
    pub fn effective_target(&self) -> Option<&str> {
        match self.action {
            RuleAction::End => Some(END_SENTINEL),
            RuleAction::Skip | RuleAction::Show => self.target_question_id.as_deref(),
        }
    }
}

/// A logic rule plus presentation fields for the builder UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicRuleView {
    #[serde(flatten)]
    pub rule: LogicRule,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_condition: Option<Condition>,
}

impl LogicRuleView {
    pub fn from_rule(rule: &LogicRule) -> Self {
        let parsed_condition = rule.parsed_condition().and_then(|r| r.ok());
        let when = match (&parsed_condition, rule.is_unconditional()) {
            (_, true) => "Always".to_string(),
            (Some(cond), false) => format!("If {cond}"),
            (None, false) => format!(
                "If {} (unparsed)",
                rule.condition.as_deref().unwrap_or_default().trim()
            ),
        };
        let then = match rule.action {
            RuleAction::End => "end survey".to_string(),
            RuleAction::Skip => format!(
                "skip to {}",
                rule.target_question_id.as_deref().unwrap_or("?")
            ),
            RuleAction::Show => format!(
                "show {}",
                rule.target_question_id.as_deref().unwrap_or("?")
            ),
        };
        Self {
            rule: rule.clone(),
            label: format!("{when}, {then}"),
            parsed_condition,
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One survey question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub order: i64,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub logic_rules: Vec<LogicRule>,
    #[serde(default)]
    pub scorable: bool,
    #[serde(default = "default_weight")]
    pub score_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_category: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub option_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub reverse_scored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

impl Question {
    pub fn new(id: impl Into<String>, order: i64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order,
            text: text.into(),
            question_type: QuestionType::default(),
            required: false,
            logic_rules: Vec::new(),
            scorable: false,
            score_weight: default_weight(),
            scoring_category: None,
            option_scores: BTreeMap::new(),
            options: Vec::new(),
            reverse_scored: false,
            min_value: None,
            max_value: None,
        }
    }

    pub fn with_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = question_type;
        self
    }

    pub fn with_rule(mut self, rule: LogicRule) -> Self {
        self.logic_rules.push(rule);
        self
    }

    /// Mark the question scorable with the given weight and optional category.
    pub fn scorable(mut self, category: Option<&str>, weight: f64) -> Self {
        self.scorable = true;
        self.scoring_category = category.map(str::to_string);
        self.score_weight = weight;
        self
    }

    /// Set options and their scores in one go.
    pub fn with_option_scores(mut self, scores: &[(&str, f64)]) -> Self {
        self.options = scores.iter().map(|(o, _)| o.to_string()).collect();
        self.option_scores = scores.iter().map(|(o, s)| (o.to_string(), *s)).collect();
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse_scored = true;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    /// Largest configured option score, or 0 when none are set.
    pub fn max_option_score(&self) -> f64 {
        self.option_scores
            .values()
            .copied()
            .filter(|s| s.is_finite())
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
            .unwrap_or(0.0)
    }

    /// Weight is usable for scoring: finite and non-negative.
    pub fn has_valid_weight(&self) -> bool {
        self.score_weight.is_finite() && self.score_weight >= 0.0
    }
}

/// Persisted shape of a score band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub id: String,
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub label: String,
}

impl ScoreBand {
    pub fn new(id: impl Into<String>, min: i32, max: i32, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            min,
            max,
            label: label.into(),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, score: i64) -> bool {
        i64::from(self.min) <= score && score <= i64::from(self.max)
    }
}

/// A score band plus presentation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBandView {
    #[serde(flatten)]
    pub band: ScoreBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ScoreBand> for ScoreBandView {
    fn from(band: ScoreBand) -> Self {
        Self {
            band,
            color: None,
            description: None,
        }
    }
}

/// Low / medium / high bands covering 0..=100.
pub fn default_score_ranges() -> Vec<ScoreBandView> {
    vec![
        ScoreBandView {
            band: ScoreBand::new("low", 0, 39, "Low"),
            color: Some("#ef4444".to_string()),
            description: None,
        },
        ScoreBandView {
            band: ScoreBand::new("medium", 40, 69, "Medium"),
            color: Some("#f59e0b".to_string()),
            description: None,
        },
        ScoreBandView {
            band: ScoreBand::new("high", 70, 100, "High"),
            color: Some("#22c55e".to_string()),
            description: None,
        },
    ]
}

/// A named group of scorable questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringCategory {
    pub id: String,
    #[serde(default, alias = "label")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScoringCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// Survey-level scoring setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub categories: Vec<ScoringCategory>,
    #[serde(default)]
    pub score_ranges: Vec<ScoreBandView>,
}

impl ScoreConfig {
    pub fn enabled(categories: Vec<ScoringCategory>, score_ranges: Vec<ScoreBandView>) -> Self {
        Self {
            enabled: true,
            categories,
            score_ranges,
        }
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    /// First band, in configured order, containing the score.
    pub fn match_band(&self, score: i64) -> Option<&ScoreBandView> {
        self.score_ranges.iter().find(|b| b.band.contains(score))
    }
}

/// A respondent's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    /// Keys to look up in `optionScores`.
    pub fn option_keys(&self) -> Vec<String> {
        match self {
            AnswerValue::Bool(true) => vec!["yes".to_string(), "true".to_string()],
            AnswerValue::Bool(false) => vec!["no".to_string(), "false".to_string()],
            AnswerValue::Number(n) => vec![format_number(*n)],
            AnswerValue::Text(s) => vec![s.clone()],
            AnswerValue::Many(items) => items.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) if n.is_finite() => Some(*n),
            AnswerValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Empty text or an empty selection counts as no answer.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Many(items) => items.is_empty(),
            AnswerValue::Bool(_) | AnswerValue::Number(_) => false,
        }
    }
}
