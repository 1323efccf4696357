//! Logic rule consistency checks.
//!
//! Works over the raw rule lists rather than the graph:
//! - rules pointing at questions that do not exist
//! - conditions that do not parse, or reference unknown questions
//! - rules sharing one trigger but sending the respondent to different places

use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};
use crate::model::{LogicRule, Question, RuleAction, END_SENTINEL};

/// Rule conflict analyzer.
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
        "conflicts"
    }

    fn description(&self) -> &'static str {
        "Detect rules with missing targets, bad conditions, or conflicting outcomes"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let mut analysis = Analysis::default();

        for question in ctx.questions {
            for rule in &question.logic_rules {
                analysis.rules_checked += 1;
                check_target(ctx, question, rule, &mut analysis.issues);
                check_condition(ctx, question, rule, &mut analysis.issues);
            }
            check_conflicts(question, &mut analysis);
        }

        analysis
    }
}

fn check_target(
    ctx: &SurveyContext<'_>,
    question: &Question,
    rule: &LogicRule,
    issues: &mut Vec<ValidationIssue>,
) {
    // Blank counts as absent; anything else must match a question id exactly.
    let target = rule
        .target_question_id
        .as_deref()
        .filter(|t| !t.trim().is_empty());

    if rule.action == RuleAction::End {
        if let Some(target) = target {
            issues.push(
                ValidationIssue::warning(
                    Domain::Logic,
                    IssueCode::EndRuleWithTarget,
                    format!(
                        "End rule \"{}\" on question \"{}\" carries target \"{}\", which is ignored",
                        rule.id, question.id, target
                    ),
                )
                .with_question(question.id.clone())
                .with_rule(rule.id.clone())
                .with_details(json!({ "target": target })),
            );
        }
        return;
    }

    let missing = match target {
        None => Some("(none)"),
        Some(t) if t == END_SENTINEL || ctx.has_question(t) => None,
        Some(t) => Some(t),
    };
    if let Some(target) = missing {
        issues.push(
            ValidationIssue::error(
                Domain::Logic,
                IssueCode::MissingTarget,
                format!(
                    "Rule \"{}\" on question \"{}\" targets missing question \"{}\"",
                    rule.id, question.id, target
                ),
            )
            .with_question(question.id.clone())
            .with_rule(rule.id.clone())
            .with_details(json!({ "target": target, "action": rule.action })),
        );
    }
}

fn check_condition(
    ctx: &SurveyContext<'_>,
    question: &Question,
    rule: &LogicRule,
    issues: &mut Vec<ValidationIssue>,
) {
    match rule.parsed_condition() {
        None => {}
        Some(Err(err)) => issues.push(
            ValidationIssue::warning(
                Domain::Logic,
                IssueCode::InvalidCondition,
                format!(
                    "Rule \"{}\" on question \"{}\" has an unreadable condition: {}",
                    rule.id, question.id, err
                ),
            )
            .with_question(question.id.clone())
            .with_rule(rule.id.clone())
            .with_details(json!({
                "condition": rule.condition,
                "reason": err.to_string(),
            })),
        ),
        Some(Ok(cond)) if !ctx.has_question(&cond.question_id) => issues.push(
            ValidationIssue::warning(
                Domain::Logic,
                IssueCode::ConditionUnknownQuestion,
                format!(
                    "Rule \"{}\" on question \"{}\" tests the answer of unknown question \"{}\"",
                    rule.id, question.id, cond.question_id
                ),
            )
            .with_question(question.id.clone())
            .with_rule(rule.id.clone())
            .with_details(json!({ "referencedQuestionId": cond.question_id })),
        ),
        Some(Ok(_)) => {}
    }
}

/// Grouping key for a rule trigger. Parsed conditions use their canonical
/// rendering so spacing and quote style do not split a group.
fn trigger_key(rule: &LogicRule) -> String {
    match rule.parsed_condition() {
        None => String::new(),
        Some(Ok(cond)) => cond.to_string(),
        Some(Err(_)) => rule.condition.as_deref().unwrap_or_default().trim().to_string(),
    }
}

fn check_conflicts(question: &Question, analysis: &mut Analysis) {
    // Vec keeps first-seen order for stable output.
    let mut groups: Vec<(String, Vec<&LogicRule>)> = Vec::new();
    for rule in &question.logic_rules {
        let key = trigger_key(rule);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, rules)) => rules.push(rule),
            None => groups.push((key, vec![rule])),
        }
    }

    for (key, rules) in groups {
        let mut targets: Vec<&str> = Vec::new();
        for rule in &rules {
            if let Some(target) = rule.effective_target() {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        if targets.len() < 2 {
            continue;
        }

        let rule_ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        let condition = if key.is_empty() {
            "(unconditional)".to_string()
        } else {
            key.clone()
        };
        analysis.conflicts.push(RuleConflict {
            question_id: question.id.clone(),
            condition: condition.clone(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
            rule_ids: rule_ids.iter().map(|r| r.to_string()).collect(),
        });
        analysis.issues.push(
            ValidationIssue::warning(
                Domain::Logic,
                IssueCode::ConflictingRules,
                format!(
                    "Question \"{}\" has {} rules for {} leading to different targets: {}",
                    question.id,
                    rules.len(),
                    condition,
                    targets.join(", ")
                ),
            )
            .with_question(question.id.clone())
            .with_rule(rule_ids[0])
            .with_details(json!({
                "condition": condition,
                "targets": targets,
                "ruleIds": rule_ids,
            })),
        );
    }
}

/// Rules sharing a trigger with divergent targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConflict {
    pub question_id: String,
    pub condition: String,
    pub targets: Vec<String>,
    pub rule_ids: Vec<String>,
}

/// Result of rule analysis.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub rules_checked: usize,
    pub conflicts: Vec<RuleConflict>,
    pub issues: Vec<ValidationIssue>,
}
