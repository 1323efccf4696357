//! Validation aggregation.
//!
//! Runs every survey analyzer in a fixed order and folds their issues into a
//! single report with severity counts and a publish verdict.

mod types;

use std::time::Instant;

use crate::analyzers::{
    BandAnalyzer, CategoryAnalyzer, ConflictAnalyzer, CycleAnalyzer, ReachabilityAnalyzer,
    ShapeAnalyzer, WeightAnalyzer,
};
use crate::config::Config;
use crate::core::{Analyzer, DiagnosticObserver, NoopObserver, SurveyContext, ValidationIssue};
use crate::model::{Question, ScoreConfig};

pub use types::{DomainSummary, FlowSummary, SurveyValidationResult, ValidationSummary};

/// Validate a survey with default thresholds.
pub fn validate_survey(
    questions: &[Question],
    score_config: Option<&ScoreConfig>,
) -> SurveyValidationResult {
    SurveyValidator::default().validate(questions, score_config)
}

/// Runs all analyzers over one survey snapshot.
#[derive(Debug, Clone, Default)]
pub struct SurveyValidator {
    config: Config,
}

impl SurveyValidator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validate(
        &self,
        questions: &[Question],
        score_config: Option<&ScoreConfig>,
    ) -> SurveyValidationResult {
        self.validate_with_observer(questions, score_config, &NoopObserver)
    }

    /// Validate, reporting diagnostics such as flow loops to `observer`.
    pub fn validate_with_observer(
        &self,
        questions: &[Question],
        score_config: Option<&ScoreConfig>,
        observer: &dyn DiagnosticObserver,
    ) -> SurveyValidationResult {
        let start = Instant::now();
        let ctx =
            SurveyContext::new(questions, score_config, &self.config).with_observer(observer);
        let mut issues: Vec<ValidationIssue> = Vec::new();
        let mut flow = FlowSummary {
            question_count: questions.len(),
            rule_count: questions.iter().map(|q| q.logic_rules.len()).sum(),
            ..FlowSummary::default()
        };

        issues.extend(run(&ShapeAnalyzer::new(), &ctx).issues);

        if !questions.is_empty() {
            let reachability = run(&ReachabilityAnalyzer::new(), &ctx);
            flow.reachable_count = reachability.reachable.len();
            flow.unreachable_count = reachability.unreachable.len();
            issues.extend(reachability.issues);

            let cycles = run(&CycleAnalyzer::new(), &ctx);
            flow.backwards_jump_count = cycles.backwards_jumps.len();
            flow.loop_count = cycles.revisits.len();
            issues.extend(cycles.issues);

            issues.extend(run(&ConflictAnalyzer::new(), &ctx).issues);
        }

        if ctx.scoring().is_some() {
            issues.extend(run(&BandAnalyzer::new(), &ctx).issues);
            issues.extend(run(&CategoryAnalyzer::new(), &ctx).issues);
            issues.extend(run(&WeightAnalyzer::new(), &ctx).issues);
        }

        let result = SurveyValidationResult::from_issues(issues, flow);
        tracing::debug!(
            questions = questions.len(),
            errors = result.summary.error_count,
            warnings = result.summary.warning_count,
            elapsed_us = start.elapsed().as_micros() as u64,
            "survey validation complete"
        );
        result
    }
}

fn run<A: Analyzer>(analyzer: &A, ctx: &SurveyContext<'_>) -> A::Output {
    let start = Instant::now();
    let output = analyzer.analyze(ctx);
    tracing::debug!(
        analyzer = analyzer.name(),
        description = analyzer.description(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "analyzer complete"
    );
    output
}
