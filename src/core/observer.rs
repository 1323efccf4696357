//! Structured diagnostics for suspicious-but-legal engine states.
//!
//! The engine never logs on its own behalf. Callers that want to hear about
//! these states inject an observer; the default one drops everything.

use std::sync::Mutex;

use serde::Serialize;

/// A suspicious state noticed during a computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Responses exist but no dimension produced a score.
    AllDimensionScoresNull { response_count: u64 },
    /// A category has no attainable points, so its score was forced to 0.
    ZeroMaxPossible { category_id: String },
    /// A normalized score fell outside every configured band.
    NoBandMatch { category_id: String, score: u32 },
    /// An answer was supplied for a question id the survey does not contain.
    UnknownAnsweredQuestion { question_id: String },
    /// A flow edge leads back onto the current path, so respondents can loop.
    LoopDetected {
        from: String,
        to: String,
        rule_id: Option<String>,
    },
}

/// Receives diagnostic events.
pub trait DiagnosticObserver: Send + Sync {
    fn observe(&self, event: &DiagnosticEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DiagnosticObserver for NoopObserver {
    fn observe(&self, _event: &DiagnosticEvent) {}
}

/// Forwards events to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DiagnosticObserver for TracingObserver {
    fn observe(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::AllDimensionScoresNull { response_count } => {
                tracing::warn!(response_count, "all dimension scores are null");
            }
            DiagnosticEvent::ZeroMaxPossible { category_id } => {
                tracing::warn!(%category_id, "category has zero max possible score");
            }
            DiagnosticEvent::NoBandMatch { category_id, score } => {
                tracing::warn!(%category_id, score, "score matched no band");
            }
            DiagnosticEvent::UnknownAnsweredQuestion { question_id } => {
                tracing::warn!(%question_id, "answer supplied for unknown question");
            }
            DiagnosticEvent::LoopDetected { from, to, rule_id } => {
                tracing::warn!(%from, %to, rule_id = rule_id.as_deref(), "survey flow can loop");
            }
        }
    }
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticObserver for CollectingObserver {
    fn observe(&self, event: &DiagnosticEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_observer_records_in_order() {
        let observer = CollectingObserver::new();
        observer.observe(&DiagnosticEvent::ZeroMaxPossible {
            category_id: "eng".to_string(),
        });
        observer.observe(&DiagnosticEvent::AllDimensionScoresNull { response_count: 4 });
        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DiagnosticEvent::ZeroMaxPossible { .. }));
    }

    #[test]
    fn test_noop_observer_is_silent() {
        // Should not panic
        NoopObserver.observe(&DiagnosticEvent::AllDimensionScoresNull { response_count: 1 });
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = DiagnosticEvent::NoBandMatch {
            category_id: "eng".to_string(),
            score: 42,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"no_band_match\""));
        assert!(json.contains("\"score\":42"));
    }
}
