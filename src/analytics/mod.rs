//! Analytics state classification.
//!
//! Decides which analytics views may render for a survey, from aggregate
//! response and scoring figures. States are checked in priority order and the
//! first match wins.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{DiagnosticEvent, DiagnosticObserver, NoopObserver, Severity};
use crate::model::{ScoreBandView, ScoringCategory};

/// Aggregate figures the classifier works from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsInput {
    pub response_count: u64,
    pub scoring_enabled: bool,
    pub categories: Vec<ScoringCategory>,
    pub score_ranges: Vec<ScoreBandView>,
    /// Computed score per dimension; `None` when it could not be computed.
    pub dimension_scores: BTreeMap<String, Option<f64>>,
    pub version_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyticsState {
    NoResponses,
    NoScoring,
    MisconfiguredScoring,
    SingleVersion,
    Healthy,
}

impl AnalyticsState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsState::NoResponses => "no-responses",
            AnalyticsState::NoScoring => "no-scoring",
            AnalyticsState::MisconfiguredScoring => "misconfigured-scoring",
            AnalyticsState::SingleVersion => "single-version",
            AnalyticsState::Healthy => "healthy",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AnalyticsState::MisconfiguredScoring => Severity::Error,
            _ => Severity::Info,
        }
    }

    /// Visibility of the four downstream views.
    pub fn visibility(&self) -> Visibility {
        match self {
            AnalyticsState::NoResponses => Visibility::default(),
            AnalyticsState::NoScoring | AnalyticsState::MisconfiguredScoring => Visibility {
                participation: true,
                question_summary: true,
                ..Visibility::default()
            },
            AnalyticsState::SingleVersion => Visibility {
                scoring: true,
                participation: true,
                question_summary: true,
                trends: false,
            },
            AnalyticsState::Healthy => Visibility {
                scoring: true,
                trends: true,
                participation: true,
                question_summary: true,
            },
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AnalyticsState::NoResponses => "No responses yet",
            AnalyticsState::NoScoring => "Scoring is not enabled for this survey",
            AnalyticsState::MisconfiguredScoring => "Scoring is enabled but misconfigured",
            AnalyticsState::SingleVersion => "Only one survey version; trends need at least two",
            AnalyticsState::Healthy => "Analytics are available",
        }
    }
}

impl fmt::Display for AnalyticsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub scoring: bool,
    pub trends: bool,
    pub participation: bool,
    pub question_summary: bool,
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStateResult {
    pub state: AnalyticsState,
    pub severity: Severity,
    pub show_scoring: bool,
    pub show_trends: bool,
    pub show_participation: bool,
    pub show_question_summary: bool,
    pub message: String,
    /// Why this state was chosen.
    pub reason: String,
}

impl AnalyticsStateResult {
    fn new(state: AnalyticsState, reason: impl Into<String>) -> Self {
        let visibility = state.visibility();
        Self {
            state,
            severity: state.severity(),
            show_scoring: visibility.scoring,
            show_trends: visibility.trends,
            show_participation: visibility.participation,
            show_question_summary: visibility.question_summary,
            message: state.message().to_string(),
            reason: reason.into(),
        }
    }
}

pub fn classify_analytics_state(input: &AnalyticsInput) -> AnalyticsStateResult {
    classify_with_observer(input, &NoopObserver)
}

/// Classify, reporting an all-null score set to `observer`.
pub fn classify_with_observer(
    input: &AnalyticsInput,
    observer: &dyn DiagnosticObserver,
) -> AnalyticsStateResult {
    if input.response_count == 0 {
        return AnalyticsStateResult::new(AnalyticsState::NoResponses, "responseCount is 0");
    }
    if !input.scoring_enabled {
        return AnalyticsStateResult::new(AnalyticsState::NoScoring, "scoring is disabled");
    }
    if input.categories.is_empty() {
        return AnalyticsStateResult::new(
            AnalyticsState::MisconfiguredScoring,
            "no scoring categories are defined",
        );
    }
    if input.score_ranges.is_empty() {
        return AnalyticsStateResult::new(
            AnalyticsState::MisconfiguredScoring,
            "no score ranges are defined",
        );
    }
    if input.dimension_scores.values().all(Option::is_none) {
        observer.observe(&DiagnosticEvent::AllDimensionScoresNull {
            response_count: input.response_count,
        });
        return AnalyticsStateResult::new(
            AnalyticsState::MisconfiguredScoring,
            format!(
                "all dimension scores are null despite {} responses",
                input.response_count
            ),
        );
    }
    if input.version_count <= 1 {
        return AnalyticsStateResult::new(
            AnalyticsState::SingleVersion,
            format!("versionCount is {}", input.version_count),
        );
    }
    AnalyticsStateResult::new(AnalyticsState::Healthy, "scoring configured with multiple versions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CollectingObserver;
    use crate::model::default_score_ranges;

    fn healthy() -> AnalyticsInput {
        AnalyticsInput {
            response_count: 10,
            scoring_enabled: true,
            categories: vec![ScoringCategory::new("eng", "Engagement")],
            score_ranges: default_score_ranges(),
            dimension_scores: [("eng".to_string(), Some(72.0))].into_iter().collect(),
            version_count: 3,
        }
    }

    #[test]
    fn test_healthy() {
        let result = classify_analytics_state(&healthy());
        assert_eq!(result.state, AnalyticsState::Healthy);
        assert!(result.show_scoring && result.show_trends);
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn test_no_responses_wins_over_everything() {
        let input = AnalyticsInput {
            response_count: 0,
            scoring_enabled: false,
            ..healthy()
        };
        let result = classify_analytics_state(&input);
        assert_eq!(result.state, AnalyticsState::NoResponses);
        assert!(!result.show_participation);
        assert!(!result.show_question_summary);
    }

    #[test]
    fn test_no_scoring() {
        let input = AnalyticsInput {
            scoring_enabled: false,
            ..healthy()
        };
        let result = classify_analytics_state(&input);
        assert_eq!(result.state, AnalyticsState::NoScoring);
        assert!(!result.show_scoring);
        assert!(result.show_participation);
    }

    #[test]
    fn test_all_null_scores_are_misconfigured() {
        let observer = CollectingObserver::new();
        let input = AnalyticsInput {
            dimension_scores: [("eng".to_string(), None)].into_iter().collect(),
            ..healthy()
        };
        let result = classify_with_observer(&input, &observer);
        assert_eq!(result.state, AnalyticsState::MisconfiguredScoring);
        assert!(!result.show_scoring);
        assert_eq!(result.severity, Severity::Error);
        assert_eq!(
            observer.events(),
            vec![DiagnosticEvent::AllDimensionScoresNull { response_count: 10 }]
        );
    }

    #[test]
    fn test_missing_categories_or_bands() {
        let no_categories = AnalyticsInput {
            categories: vec![],
            ..healthy()
        };
        assert_eq!(
            classify_analytics_state(&no_categories).state,
            AnalyticsState::MisconfiguredScoring
        );
        let no_bands = AnalyticsInput {
            score_ranges: vec![],
            ..healthy()
        };
        assert_eq!(
            classify_analytics_state(&no_bands).state,
            AnalyticsState::MisconfiguredScoring
        );
    }

    #[test]
    fn test_single_version() {
        let input = AnalyticsInput {
            version_count: 1,
            ..healthy()
        };
        let result = classify_analytics_state(&input);
        assert_eq!(result.state, AnalyticsState::SingleVersion);
        assert!(result.show_scoring);
        assert!(!result.show_trends);
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let input: AnalyticsInput = serde_json::from_str(
            r#"{"responseCount": 4, "scoringEnabled": true, "dimensionScores": {"eng": null}}"#,
        )
        .unwrap();
        assert_eq!(input.response_count, 4);
        assert_eq!(input.dimension_scores.get("eng"), Some(&None));
        assert_eq!(input.version_count, 0);
    }

    #[test]
    fn test_state_serializes_kebab_case() {
        let json = serde_json::to_value(classify_analytics_state(&AnalyticsInput::default())).unwrap();
        assert_eq!(json["state"], "no-responses");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["showScoring"], false);
    }
}
