//! Analyzer trait and the shared survey context.

use serde::Serialize;

use super::observer::{DiagnosticObserver, NoopObserver};
use crate::config::Config;
use crate::graph::QuestionGraph;
use crate::model::{Question, ScoreConfig};

static NOOP: NoopObserver = NoopObserver;

/// Trait implemented by all survey analyzers.
///
/// Analyzers are infallible: whatever they find is part of their output.
pub trait Analyzer: Send + Sync {
    /// The report type produced by this analyzer.
    type Output: Serialize;

    /// Unique identifier for this analyzer.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Run analysis over one survey snapshot.
    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output;
}

/// Context shared by all analyzers during one validation run.
pub struct SurveyContext<'a> {
    /// Questions in canonical order.
    pub questions: &'a [Question],
    /// Scoring setup, if the survey has one.
    pub score_config: Option<&'a ScoreConfig>,
    /// Configuration.
    pub config: &'a Config,
    /// Flow graph built once from `questions`.
    pub graph: QuestionGraph,
    /// Receiver for diagnostic events.
    pub observer: &'a dyn DiagnosticObserver,
}

impl<'a> SurveyContext<'a> {
    /// Create a new survey context.
    pub fn new(
        questions: &'a [Question],
        score_config: Option<&'a ScoreConfig>,
        config: &'a Config,
    ) -> Self {
        Self {
            questions,
            score_config,
            config,
            graph: crate::graph::build_graph(questions),
            observer: &NOOP,
        }
    }

    /// Attach a diagnostic observer.
    pub fn with_observer(mut self, observer: &'a dyn DiagnosticObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn has_question(&self, id: &str) -> bool {
        self.graph.position(id).is_some()
    }

    /// The score config, only when scoring is switched on.
    pub fn scoring(&self) -> Option<&'a ScoreConfig> {
        self.score_config.filter(|c| c.enabled)
    }

    /// Scorable questions in survey order.
    pub fn scorable_questions(&self) -> impl Iterator<Item = &'a Question> {
        self.questions.iter().filter(|q| q.scorable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::observer::{CollectingObserver, DiagnosticEvent};

    fn questions() -> Vec<Question> {
        vec![
            Question::new("q1", 0, "First"),
            Question::new("q2", 1, "Second").scorable(Some("eng"), 2.0),
            Question::new("q1", 2, "Duplicate id"),
        ]
    }

    #[test]
    fn test_has_question_is_exact() {
        let qs = questions();
        let config = Config::default();
        let ctx = SurveyContext::new(&qs, None, &config);
        assert!(ctx.has_question("q1"));
        assert!(ctx.has_question("q2"));
        assert!(!ctx.has_question(" q2"));
        assert!(!ctx.has_question("ghost"));
    }

    #[test]
    fn test_scoring_requires_enabled() {
        let qs = questions();
        let config = Config::default();
        let disabled = ScoreConfig::default();
        let ctx = SurveyContext::new(&qs, Some(&disabled), &config);
        assert!(ctx.scoring().is_none());

        let enabled = ScoreConfig {
            enabled: true,
            ..ScoreConfig::default()
        };
        let ctx = SurveyContext::new(&qs, Some(&enabled), &config);
        assert!(ctx.scoring().is_some());
        assert_eq!(ctx.scorable_questions().count(), 1);
    }

    #[test]
    fn test_context_builds_graph() {
        let qs = questions();
        let config = Config::default();
        let ctx = SurveyContext::new(&qs, None, &config);
        assert_eq!(ctx.graph.nodes.len(), 3);
        assert_eq!(ctx.graph.entry_node.as_deref(), Some("q1"));
    }

    #[test]
    fn test_with_observer() {
        let qs = questions();
        let config = Config::default();
        let observer = CollectingObserver::new();
        let ctx = SurveyContext::new(&qs, None, &config).with_observer(&observer);
        ctx.observer
            .observe(&DiagnosticEvent::AllDimensionScoresNull { response_count: 1 });
        assert_eq!(observer.events().len(), 1);
    }
}
