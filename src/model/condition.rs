//! Rule condition expressions.
//!
//! A condition has the form `answer("question_id") <op> <literal>`, where the
//! operator is one of `==`, `!=`, `<`, `<=`, `>`, `>=` and the literal is a quoted
//! string, a number, `true`/`false`, or a bare word.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static ANSWER_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^answer\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#).expect("Invalid answer pattern")
});

/// Why a condition string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("condition is empty")]
    Empty,
    #[error("expected `answer(\"<question id>\")` at start of condition")]
    MissingAnswerReference,
    #[error("expected one of ==, !=, <, <=, >, >= but found `{0}`")]
    MissingOperator(String),
    #[error("missing value after operator")]
    MissingValue,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unexpected input after value: `{0}`")]
    InvalidValue(String),
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Operator {
    /// Two-character operators come first so `<=` is not read as `<`.
    const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Le,
        Operator::Ge,
        Operator::Lt,
        Operator::Gt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Bool(b) => write!(f, "{b}"),
            ConditionValue::Number(n) => f.write_str(&format_number(*n)),
            ConditionValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub question_id: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(
        question_id: impl Into<String>,
        operator: Operator,
        value: ConditionValue,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            operator,
            value,
        }
    }

    /// Parse a condition string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let caps = ANSWER_REF
            .captures(input)
            .ok_or(ParseError::MissingAnswerReference)?;
        let question_id = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if question_id.is_empty() {
            return Err(ParseError::MissingAnswerReference);
        }

        let rest = input[caps[0].len()..].trim_start();
        let operator = Operator::ALL
            .into_iter()
            .find(|op| rest.starts_with(op.as_str()))
            .ok_or_else(|| ParseError::MissingOperator(rest.chars().take(16).collect()))?;

        let value = parse_value(rest[operator.as_str().len()..].trim())?;

        Ok(Self {
            question_id: question_id.to_string(),
            operator,
            value,
        })
    }
}

impl FromStr for Condition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "answer(\"{}\") {} {}",
            self.question_id, self.operator, self.value
        )
    }
}

fn parse_value(raw: &str) -> Result<ConditionValue, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingValue);
    }

    let first = raw.chars().next().unwrap_or_default();
    if first == '"' || first == '\'' {
        let body = &raw[1..];
        let close = body.find(first).ok_or(ParseError::UnterminatedString)?;
        let trailing = body[close + 1..].trim();
        if !trailing.is_empty() {
            return Err(ParseError::InvalidValue(trailing.to_string()));
        }
        return Ok(ConditionValue::Text(body[..close].to_string()));
    }

    match raw {
        "true" => return Ok(ConditionValue::Bool(true)),
        "false" => return Ok(ConditionValue::Bool(false)),
        _ => {}
    }

    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() {
            return Ok(ConditionValue::Number(n));
        }
    }

    Ok(ConditionValue::Text(raw.to_string()))
}

/// Render a number without a trailing `.0` when it is integral.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
