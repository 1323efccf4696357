//! Survey shape checks: question count, id uniqueness, text and ordering.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};

/// Survey shape analyzer.
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
        "shape"
    }

    fn description(&self) -> &'static str {
        "Check question count, duplicate ids, empty text, and ordering"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let questions = ctx.questions;
        let mut analysis = Analysis {
            question_count: questions.len(),
            ..Analysis::default()
        };

        if questions.is_empty() {
            analysis.issues.push(ValidationIssue::error(
                Domain::General,
                IssueCode::NoQuestions,
                "Survey has no questions",
            ));
            return analysis;
        }

        let limit = ctx.config.limits.max_questions;
        if questions.len() > limit {
            analysis.issues.push(
                ValidationIssue::warning(
                    Domain::General,
                    IssueCode::TooManyQuestions,
                    format!(
                        "Survey has {} questions; more than {} hurts completion rates",
                        questions.len(),
                        limit
                    ),
                )
                .with_details(json!({ "count": questions.len(), "limit": limit })),
            );
        }

        analysis.duplicate_ids = duplicate_ids(questions.iter().map(|q| q.id.as_str()));
        for duplicate in &analysis.duplicate_ids {
            analysis.issues.push(
                ValidationIssue::error(
                    Domain::General,
                    IssueCode::DuplicateQuestionIds,
                    format!(
                        "Question id \"{}\" is used by {} questions",
                        duplicate.id, duplicate.count
                    ),
                )
                .with_question(duplicate.id.clone())
                .with_details(json!({ "count": duplicate.count })),
            );
        }

        for question in questions {
            if question.text.trim().is_empty() {
                analysis.issues.push(
                    ValidationIssue::error(
                        Domain::General,
                        IssueCode::EmptyQuestionText,
                        format!("Question \"{}\" has no text", question.id),
                    )
                    .with_question(question.id.clone()),
                );
            }
        }

        for (position, question) in questions.iter().enumerate() {
            let expected = position as i64;
            if question.order != expected {
                analysis.issues.push(
                    ValidationIssue::error(
                        Domain::General,
                        IssueCode::InvalidQuestionOrder,
                        format!(
                            "Question \"{}\" has order {} but sits at position {}",
                            question.id, question.order, expected
                        ),
                    )
                    .with_question(question.id.clone())
                    .with_details(json!({ "expected": expected, "actual": question.order })),
                );
            }
        }

        analysis
    }
}

/// Ids occurring more than once, in order of first appearance.
fn duplicate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<DuplicateId> {
    let mut seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            seen.push(id);
        }
        *count += 1;
    }
    seen.into_iter()
        .filter_map(|id| {
            let count = counts[id];
            (count > 1).then(|| DuplicateId {
                id: id.to_string(),
                count,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateId {
    pub id: String,
    pub count: usize,
}

/// Result of shape analysis.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub question_count: usize,
    pub duplicate_ids: Vec<DuplicateId>,
    pub issues: Vec<ValidationIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::Severity;
    use crate::model::Question;

    fn run_with(questions: &[Question], config: &Config) -> Analysis {
        let ctx = SurveyContext::new(questions, None, config);
        Analyzer::new().analyze(&ctx)
    }

    fn run(questions: &[Question]) -> Analysis {
        run_with(questions, &Config::default())
    }

    fn codes(analysis: &Analysis) -> Vec<IssueCode> {
        analysis.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_empty_survey() {
        let result = run(&[]);
        assert_eq!(codes(&result), vec![IssueCode::NoQuestions]);
        assert!(result.issues[0].is_error());
    }

    #[test]
    fn test_well_formed_survey() {
        let qs = vec![Question::new("q1", 0, "One"), Question::new("q2", 1, "Two")];
        assert!(run(&qs).issues.is_empty());
    }

    #[test]
    fn test_too_many_questions() {
        let qs: Vec<Question> = (0..4)
            .map(|i| Question::new(format!("q{}", i), i, "text"))
            .collect();
        let mut config = Config::default();
        config.limits.max_questions = 3;
        let result = run_with(&qs, &config);
        assert_eq!(codes(&result), vec![IssueCode::TooManyQuestions]);
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_duplicate_ids_reported_once_per_id() {
        let qs = vec![
            Question::new("b", 0, "One"),
            Question::new("a", 1, "Two"),
            Question::new("b", 2, "Three"),
            Question::new("a", 3, "Four"),
            Question::new("b", 4, "Five"),
        ];
        let result = run(&qs);
        assert_eq!(
            result.duplicate_ids,
            vec![
                DuplicateId { id: "b".to_string(), count: 3 },
                DuplicateId { id: "a".to_string(), count: 2 },
            ]
        );
        assert_eq!(codes(&result), vec![IssueCode::DuplicateQuestionIds; 2]);
    }

    #[test]
    fn test_empty_text_and_bad_order() {
        let qs = vec![Question::new("q1", 0, "   "), Question::new("q2", 5, "Two")];
        let result = run(&qs);
        assert_eq!(
            codes(&result),
            vec![IssueCode::EmptyQuestionText, IssueCode::InvalidQuestionOrder]
        );
        let details = result.issues[1].details.as_ref().unwrap();
        assert_eq!(details["expected"], 1);
        assert_eq!(details["actual"], 5);
    }
}
