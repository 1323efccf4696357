//! Validation report types.

use serde::Serialize;

use crate::core::{Domain, Severity, ValidationIssue};

/// Complete result of validating one survey.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyValidationResult {
    pub is_valid: bool,
    pub can_publish: bool,
    /// Every issue, in check order.
    pub issues: Vec<ValidationIssue>,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub logic: Vec<ValidationIssue>,
    pub scoring: Vec<ValidationIssue>,
    pub summary: ValidationSummary,
}

impl SurveyValidationResult {
    /// Split issues into the derived views and compute the verdict.
    pub fn from_issues(issues: Vec<ValidationIssue>, flow: FlowSummary) -> Self {
        let by_severity = |s: Severity| -> Vec<ValidationIssue> {
            issues.iter().filter(|i| i.severity == s).cloned().collect()
        };
        let by_domain = |d: Domain| -> Vec<ValidationIssue> {
            issues.iter().filter(|i| i.domain == d).cloned().collect()
        };

        let errors = by_severity(Severity::Error);
        let warnings = by_severity(Severity::Warning);
        let logic = by_domain(Domain::Logic);
        let scoring = by_domain(Domain::Scoring);

        let summary = ValidationSummary {
            total_issues: issues.len(),
            error_count: errors.len(),
            warning_count: warnings.len(),
            info_count: issues.iter().filter(|i| i.severity == Severity::Info).count(),
            logic: DomainSummary::of(&issues, Domain::Logic),
            scoring: DomainSummary::of(&issues, Domain::Scoring),
            general: DomainSummary::of(&issues, Domain::General),
            flow,
        };
        let is_valid = summary.error_count == 0;

        Self {
            is_valid,
            can_publish: is_valid,
            issues,
            errors,
            warnings,
            logic,
            scoring,
            summary,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total_issues: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub logic: DomainSummary,
    pub scoring: DomainSummary,
    pub general: DomainSummary,
    pub flow: FlowSummary,
}

/// Issue counts for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl DomainSummary {
    fn of(issues: &[ValidationIssue], domain: Domain) -> Self {
        let mut summary = Self::default();
        for issue in issues.iter().filter(|i| i.domain == domain) {
            match issue.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }
}

/// Flow graph figures gathered while validating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub question_count: usize,
    pub reachable_count: usize,
    pub unreachable_count: usize,
    pub backwards_jump_count: usize,
    pub loop_count: usize,
    pub rule_count: usize,
}
