//! Reachability analyzer.
//!
//! Breadth-first walk from the entry question over default flow plus skip and
//! show edges. Questions never reached are dead content.

use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;
use serde::Serialize;
use serde_json::json;

use crate::core::{Analyzer as AnalyzerTrait, Domain, IssueCode, SurveyContext, ValidationIssue};
use crate::graph::{AdjacencyView, QuestionGraph};

/// Reachability analyzer.
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
        "reachability"
    }

    fn description(&self) -> &'static str {
        "Find questions no flow path can reach from the entry question"
    }

    fn analyze(&self, ctx: &SurveyContext<'_>) -> Self::Output {
        let flags = reachable_positions(&ctx.graph);
        let mut analysis = Analysis::default();

        for (node, reachable) in ctx.graph.nodes.iter().zip(&flags) {
            if *reachable {
                analysis.reachable.push(node.id.clone());
                continue;
            }
            analysis.unreachable.push(node.id.clone());
            analysis.issues.push(
                ValidationIssue::warning(
                    Domain::Logic,
                    IssueCode::UnreachableQuestion,
                    format!(
                        "Question \"{}\" can never be shown: no path leads to it from the first question",
                        node.id
                    ),
                )
                .with_question(node.id.clone())
                .with_details(json!({ "order": node.order, "position": node.position })),
            );
        }

        analysis
    }
}

/// Reachability flag per survey position.
pub fn reachable_positions(graph: &QuestionGraph) -> Vec<bool> {
    let mut reachable = vec![false; graph.nodes.len()];
    if graph.is_empty() {
        return reachable;
    }

    let flow = graph.adjacency(AdjacencyView::Reachability);
    let mut bfs = Bfs::new(&flow, NodeIndex::new(0));
    while let Some(node) = bfs.next(&flow) {
        reachable[flow[node]] = true;
    }
    reachable
}

/// Result of reachability analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub reachable: Vec<String>,
    pub unreachable: Vec<String>,
    pub issues: Vec<ValidationIssue>,
}
