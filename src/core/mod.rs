//! Core types and traits for survey analysis.

mod analyzer;
mod error;
mod issue;
mod observer;

pub use analyzer::{Analyzer, SurveyContext};
pub use error::{Error, Result};
pub use issue::{Domain, IssueCode, Severity, ValidationIssue};
pub use observer::{
    CollectingObserver, DiagnosticEvent, DiagnosticObserver, NoopObserver, TracingObserver,
};
