//! Surveyflow - survey flow validation and scoring engine.
//!
//! Treats a survey's questions and branching rules as a directed graph and
//! checks it for unreachable questions, backwards jumps, loops, dangling
//! targets and conflicting rules. Checks the scoring setup (bands, categories,
//! weights), computes itemized score traces from answers, and classifies which
//! analytics views a survey can support.
//!
//! Every entry point is a pure function over a snapshot of its inputs.
//!
//! # Example
//!
//! ```
//! use surveyflow::model::{LogicRule, Question};
//! use surveyflow::validate_survey;
//!
//! let questions = vec![
//!     Question::new("q1", 0, "Do you use the product?")
//!         .with_rule(LogicRule::skip("r1", None, "q3")),
//!     Question::new("q2", 1, "How often?"),
//!     Question::new("q3", 2, "Anything else?"),
//! ];
//! let result = validate_survey(&questions, None);
//! assert!(result.can_publish);
//! assert_eq!(result.summary.flow.unreachable_count, 1);
//! ```

pub mod analytics;
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod graph;
pub mod model;
pub mod output;
pub mod report;
pub mod score;

pub use analytics::classify_analytics_state;
pub use core::{Analyzer, SurveyContext, ValidationIssue};
pub use report::validate_survey;
pub use score::compute_score_trace;
