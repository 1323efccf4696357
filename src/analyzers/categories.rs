//! Scoring category usage.

use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};

/// Category usage analyzer.
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
        "categories"
    }

    fn description(&self) -> &'static str {
        "Check that categories are used and scorable questions are mapped"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let Some(config) = ctx.scoring() else {
            return Analysis::default();
        };
        let mut analysis = Analysis::default();

        for category in &config.categories {
            let count = ctx
                .scorable_questions()
                .filter(|q| q.scoring_category.as_deref() == Some(category.id.as_str()))
                .count();
            analysis.usage.push(CategoryUsage {
                category_id: category.id.clone(),
                question_count: count,
            });
            if count == 0 {
                analysis.issues.push(
                    ValidationIssue::warning(
                        Domain::Scoring,
                        IssueCode::UnusedCategory,
                        format!(
                            "Category \"{}\" is not used by any scorable question",
                            display_name(&category.name, &category.id)
                        ),
                    )
                    .with_category(category.id.clone()),
                );
            }
        }

        let has_categories = !config.categories.is_empty();
        for question in ctx.scorable_questions() {
            // Category ids match exactly; only a blank id counts as unassigned.
            let category = question
                .scoring_category
                .as_deref()
                .filter(|c| !c.trim().is_empty());
            match category {
                None => {
                    if has_categories {
                        analysis.issues.push(
                            ValidationIssue::warning(
                                Domain::Scoring,
                                IssueCode::ScorableNoCategory,
                                format!(
                                    "Scorable question \"{}\" is not assigned to a category",
                                    question.id
                                ),
                            )
                            .with_question(question.id.clone()),
                        );
                    }
                }
                Some(category) if has_categories && !config.has_category(category) => {
                    analysis.issues.push(
                        ValidationIssue::error(
                            Domain::Scoring,
                            IssueCode::InvalidCategoryRef,
                            format!(
                                "Question \"{}\" references unknown category \"{}\"",
                                question.id, category
                            ),
                        )
                        .with_question(question.id.clone())
                        .with_category(category.to_string()),
                    );
                }
                Some(_) => {}
            }

            if question.question_type.is_choice_like() && question.option_scores.is_empty() {
                analysis.issues.push(
                    ValidationIssue::warning(
                        Domain::Scoring,
                        IssueCode::MissingOptionScores,
                        format!(
                            "Scorable choice question \"{}\" has no option scores",
                            question.id
                        ),
                    )
                    .with_question(question.id.clone())
                    .with_details(json!({ "type": question.question_type })),
                );
            }
        }

        analysis
    }
}

fn display_name<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.trim().is_empty() {
        id
    } else {
        name
    }
}

/// Number of scorable questions pointing at a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUsage {
    pub category_id: String,
    pub question_count: usize,
}

/// Result of category analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub usage: Vec<CategoryUsage>,
    pub issues: Vec<ValidationIssue>,
}
