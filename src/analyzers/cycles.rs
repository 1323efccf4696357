//! Backwards-jump and loop detection.
//!
//! Depth-first walk from the entry question over default flow plus skip
//! edges, keeping the recursion stack. Every skip edge whose target does not
//! come after its source is a backwards jump. When the target is still on the
//! stack the jump closes a real loop; that is recorded as a revisit.

use serde::Serialize;
use serde_json::json;

use crate::core::{
    Analyzer as AnalyzerTrait, DiagnosticEvent, Domain, IssueCode, Severity, SurveyContext,
    ValidationIssue,
};
use crate::graph::{AdjacencyView, FlowKind, QuestionGraph};

/// Cycle analyzer.
#[derive(Default)]
pub struct Analyzer {
    loops_as_errors: bool,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report loop-closing jumps as errors.
    pub fn with_loops_as_errors(mut self, enabled: bool) -> Self {
        self.loops_as_errors = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

impl AnalyzerTrait for Analyzer {
    type Output = Analysis;

    fn name(&self) -> &'static str {
        "cycles"
    }

    fn description(&self) -> &'static str {
        "Flag skip rules that jump backwards and loops in the survey flow"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let loops_as_errors = self.loops_as_errors || ctx.config.cycles.loops_as_errors;
        let mut analysis = walk(&ctx.graph);

        for revisit in &analysis.revisits {
            ctx.observer.observe(&DiagnosticEvent::LoopDetected {
                from: revisit.from.clone(),
                to: revisit.to.clone(),
                rule_id: revisit.rule_id.clone(),
            });
        }

        for jump in &analysis.backwards_jumps {
            let severity = if jump.revisit && loops_as_errors {
                Severity::Error
            } else {
                Severity::Warning
            };
            let message = if jump.revisit {
                format!(
                    "Question \"{}\" jumps back to \"{}\" and can loop",
                    jump.from, jump.to
                )
            } else {
                format!("Question \"{}\" jumps back to \"{}\"", jump.from, jump.to)
            };
            let mut issue =
                ValidationIssue::new(Domain::Logic, IssueCode::BackwardsJump, severity, message)
                    .with_question(jump.from.clone())
                    .with_details(json!({
                        "from": jump.from,
                        "to": jump.to,
                        "fromOrder": jump.from_order,
                        "toOrder": jump.to_order,
                        "revisit": jump.revisit,
                    }));
            if let Some(rule_id) = &jump.rule_id {
                issue = issue.with_rule(rule_id.clone());
            }
            analysis.issues.push(issue);
        }

        analysis
    }
}

fn walk(graph: &QuestionGraph) -> Analysis {
    let mut analysis = Analysis::default();
    if graph.is_empty() {
        return analysis;
    }

    let successors = QuestionGraph::successors(&graph.adjacency(AdjacencyView::LoopCheck));
    let mut state = vec![Visit::New; successors.len()];
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    state[0] = Visit::OnStack;

    while let Some(top) = stack.last_mut() {
        let (from, next) = *top;
        let Some((to, edge)) = successors[from].get(next) else {
            state[from] = Visit::Done;
            stack.pop();
            continue;
        };
        top.1 += 1;
        let to = *to;

        let revisit = state[to] == Visit::OnStack;
        let rule_id = edge
            .rule_edge
            .map(|i| graph.edges[i].rule.rule.id.clone());

        // Compared by list position: `order` can itself be wrong, and the
        // shape check reports that separately.
        if edge.kind == FlowKind::Skip && to <= from {
            analysis.backwards_jumps.push(BackwardsJump {
                from: graph.nodes[from].id.clone(),
                to: graph.nodes[to].id.clone(),
                from_order: graph.nodes[from].order,
                to_order: graph.nodes[to].order,
                rule_id: rule_id.clone(),
                revisit,
            });
        }
        if revisit {
            analysis.revisits.push(Revisit {
                from: graph.nodes[from].id.clone(),
                to: graph.nodes[to].id.clone(),
                rule_id,
            });
        }
        if state[to] == Visit::New {
            state[to] = Visit::OnStack;
            stack.push((to, 0));
        }
    }

    analysis
}

/// A skip rule whose target is not after its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackwardsJump {
    pub from: String,
    pub to: String,
    pub from_order: i64,
    pub to_order: i64,
    pub rule_id: Option<String>,
    /// Target was on the traversal stack, so the jump closes a loop.
    pub revisit: bool,
}

/// An edge back into the current traversal path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revisit {
    pub from: String,
    pub to: String,
    pub rule_id: Option<String>,
}

/// Result of cycle analysis.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub backwards_jumps: Vec<BackwardsJump>,
    pub revisits: Vec<Revisit>,
    pub issues: Vec<ValidationIssue>,
}
