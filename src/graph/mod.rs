//! Survey flow graph.
//!
//! Questions are nodes, logic rules are edges. The graph is derived on every
//! call and never persisted. Traversals run over one of two named adjacency
//! views that share the same node set:
//!
//! - [`AdjacencyView::Reachability`]: next-in-order + skip + show
//! - [`AdjacencyView::LoopCheck`]: next-in-order + skip

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::model::{LogicRule, LogicRuleView, Question, RuleAction, END_SENTINEL};

/// Kind of a rule edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Skip,
    Show,
    End,
}

impl From<RuleAction> for EdgeKind {
    fn from(action: RuleAction) -> Self {
        match action {
            RuleAction::Skip => EdgeKind::Skip,
            RuleAction::Show => EdgeKind::Show,
            RuleAction::End => EdgeKind::End,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub order: i64,
    pub position: usize,
    pub text: String,
    pub rules: Vec<LogicRule>,
    pub reachable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub rule: LogicRuleView,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(skip)]
    source: usize,
}

/// Derived flow graph of a survey.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGraph {
    /// Nodes in survey order.
    pub nodes: Vec<GraphNode>,
    /// One edge per logic rule that names a destination.
    pub edges: Vec<GraphEdge>,
    pub entry_node: Option<String>,
    /// Questions that can terminate the survey, in survey order.
    pub exit_nodes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacencyView {
    /// Default flow plus skip and show rules.
    Reachability,
    /// Default flow plus skip rules.
    LoopCheck,
}

impl AdjacencyView {
    fn follows(&self, kind: EdgeKind) -> bool {
        match (self, kind) {
            (_, EdgeKind::End) => false,
            (AdjacencyView::Reachability, _) => true,
            (AdjacencyView::LoopCheck, EdgeKind::Skip) => true,
            (AdjacencyView::LoopCheck, EdgeKind::Show) => false,
        }
    }
}

/// Kind of an edge in an adjacency view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Default move to the next question in order.
    Next,
    Skip,
    Show,
}

/// Edge weight in an adjacency view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub kind: FlowKind,
    /// Index into [`QuestionGraph::edges`] for rule edges.
    pub rule_edge: Option<usize>,
}

/// Adjacency view as a petgraph graph. Node weights are survey positions and
/// `NodeIndex::new(p)` is the node at position `p`.
pub type FlowGraph = DiGraph<usize, FlowEdge>;

impl QuestionGraph {
    /// Position of the first node with this id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.position(id).map(|p| &self.nodes[p])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rule edges leaving the node at `position`, in rule order.
    pub fn edges_from(&self, position: usize) -> impl Iterator<Item = (usize, &GraphEdge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.source == position)
    }

    /// Whether the default next-in-order edge leaves `position`.
    ///
    /// The last question has none. An unconditional end rule removes it, and an
    /// unconditional skip to a real question (or the end) replaces it.
    pub fn has_default_next(&self, position: usize) -> bool {
        if position + 1 >= self.nodes.len() {
            return false;
        }
        !self.nodes[position].rules.iter().any(|rule| {
            rule.is_unconditional()
                && match rule.action {
                    RuleAction::End => true,
                    RuleAction::Skip => rule
                        .target_question_id
                        .as_deref()
                        .map(|t| t == END_SENTINEL || self.index.contains_key(t))
                        .unwrap_or(false),
                    RuleAction::Show => false,
                }
        })
    }

    /// Build the petgraph adjacency for a view.
    ///
    /// For every node the default next edge is added first, then rule edges in
    /// rule order. Edges to the end sentinel or to unknown ids are left out.
    pub fn adjacency(&self, view: AdjacencyView) -> FlowGraph {
        let mut flow =
            FlowGraph::with_capacity(self.nodes.len(), self.edges.len() + self.nodes.len());
        for position in 0..self.nodes.len() {
            flow.add_node(position);
        }

        for position in 0..self.nodes.len() {
            if self.has_default_next(position) {
                flow.add_edge(
                    NodeIndex::new(position),
                    NodeIndex::new(position + 1),
                    FlowEdge {
                        kind: FlowKind::Next,
                        rule_edge: None,
                    },
                );
            }
            for (edge_index, edge) in self.edges_from(position) {
                if !view.follows(edge.kind) {
                    continue;
                }
                let Some(target) = self.position(&edge.to) else {
                    continue;
                };
                let kind = match edge.kind {
                    EdgeKind::Skip => FlowKind::Skip,
                    _ => FlowKind::Show,
                };
                flow.add_edge(
                    NodeIndex::new(position),
                    NodeIndex::new(target),
                    FlowEdge {
                        kind,
                        rule_edge: Some(edge_index),
                    },
                );
            }
        }

        flow
    }

    /// Outgoing edges of every node, in insertion order.
    pub fn successors(flow: &FlowGraph) -> Vec<Vec<(usize, FlowEdge)>> {
        let mut out = vec![Vec::new(); flow.node_count()];
        for node in flow.node_indices() {
            let mut edges: Vec<_> = flow
                .edges(node)
                .map(|e| (e.id().index(), e.target().index(), e.weight().clone()))
                .collect();
            edges.sort_by_key(|(id, _, _)| *id);
            out[node.index()] = edges.into_iter().map(|(_, t, w)| (t, w)).collect();
        }
        out
    }

    /// Copy reachability flags onto the nodes.
    pub fn mark_reachable(&mut self, reachable: &[bool]) {
        for (node, flag) in self.nodes.iter_mut().zip(reachable) {
            node.reachable = *flag;
        }
    }
}

/// Build the flow graph for an ordered question list.
///
/// Never fails: edges to unknown questions are kept so later checks can
/// report them. Only the first question starts out reachable.
pub fn build_graph(questions: &[Question]) -> QuestionGraph {
    let mut graph = QuestionGraph::default();

    for (position, question) in questions.iter().enumerate() {
        graph.index.entry(question.id.clone()).or_insert(position);
        graph.nodes.push(GraphNode {
            id: question.id.clone(),
            order: question.order,
            position,
            text: question.text.clone(),
            rules: question.logic_rules.clone(),
            reachable: position == 0,
        });
    }

    let mut exits = vec![false; questions.len()];
    for (position, question) in questions.iter().enumerate() {
        for rule in &question.logic_rules {
            let to = match rule.action {
                RuleAction::End => END_SENTINEL,
                RuleAction::Skip | RuleAction::Show => match rule.target_question_id.as_deref() {
                    Some(target) if !target.trim().is_empty() => target,
                    _ => continue,
                },
            };
            if to == END_SENTINEL {
                exits[position] = true;
            }
            graph.edges.push(GraphEdge {
                from: question.id.clone(),
                to: to.to_string(),
                rule: LogicRuleView::from_rule(rule),
                kind: rule.action.into(),
                source: position,
            });
        }
    }
    if let Some(last) = exits.last_mut() {
        *last = true;
    }

    graph.entry_node = questions.first().map(|q| q.id.clone());
    graph.exit_nodes = questions
        .iter()
        .zip(&exits)
        .filter(|(_, exit)| **exit)
        .map(|(q, _)| q.id.clone())
        .collect();
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(format!("q{}", i + 1), i as i64, format!("Question {}", i + 1)))
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = build_graph(&[]);
        assert!(graph.is_empty());
        assert!(graph.entry_node.is_none());
        assert!(graph.exit_nodes.is_empty());
        assert_eq!(graph.adjacency(AdjacencyView::Reachability).node_count(), 0);
    }

    #[test]
    fn test_entry_and_exit_nodes() {
        let mut qs = linear(4);
        qs[1] = qs[1]
            .clone()
            .with_rule(LogicRule::end("r1", Some(r#"answer("q2") == "no""#)));
        let graph = build_graph(&qs);
        assert_eq!(graph.entry_node.as_deref(), Some("q1"));
        assert_eq!(graph.exit_nodes, vec!["q2".to_string(), "q4".to_string()]);
        assert!(graph.nodes[0].reachable);
        assert!(!graph.nodes[1].reachable);
        assert_eq!(graph.edges[0].to, END_SENTINEL);
        assert_eq!(graph.edges[0].kind, EdgeKind::End);
    }

    #[test]
    fn test_rule_without_target_adds_no_edge() {
        let mut qs = linear(2);
        qs[0].logic_rules.push(LogicRule {
            id: "r1".to_string(),
            condition: None,
            action: RuleAction::Skip,
            target_question_id: None,
        });
        let graph = build_graph(&qs);
        assert!(graph.edges.is_empty());
        // An unusable skip does not cut the default flow
        assert!(graph.has_default_next(0));
    }

    #[test]
    fn test_views_differ_on_show_edges() {
        let mut qs = linear(3);
        qs[0] = qs[0]
            .clone()
            .with_rule(LogicRule::show("r1", Some(r#"answer("q1") == 1"#), "q3"))
            .with_rule(LogicRule::skip("r2", Some(r#"answer("q1") == 2"#), "q3"));
        let graph = build_graph(&qs);
        let reach = graph.adjacency(AdjacencyView::Reachability);
        let loops = graph.adjacency(AdjacencyView::LoopCheck);
        // next(q1->q2), next(q2->q3) plus rules
        assert_eq!(reach.edge_count(), 4);
        assert_eq!(loops.edge_count(), 3);
    }

    #[test]
    fn test_unconditional_skip_replaces_next() {
        let mut qs = linear(3);
        qs[0] = qs[0].clone().with_rule(LogicRule::skip("r1", None, "q3"));
        let graph = build_graph(&qs);
        assert!(!graph.has_default_next(0));
        assert!(graph.has_default_next(1));
        assert!(!graph.has_default_next(2));
    }

    #[test]
    fn test_unconditional_skip_to_ghost_keeps_next() {
        let mut qs = linear(3);
        qs[0] = qs[0].clone().with_rule(LogicRule::skip("r1", None, "ghost"));
        let graph = build_graph(&qs);
        assert!(graph.has_default_next(0));
    }

    #[test]
    fn test_successors_in_insertion_order() {
        let mut qs = linear(4);
        qs[0] = qs[0]
            .clone()
            .with_rule(LogicRule::skip("r1", Some(r#"answer("q1") == 1"#), "q4"))
            .with_rule(LogicRule::skip("r2", Some(r#"answer("q1") == 2"#), "q3"));
        let graph = build_graph(&qs);
        let succ = QuestionGraph::successors(&graph.adjacency(AdjacencyView::LoopCheck));
        let targets: Vec<usize> = succ[0].iter().map(|(t, _)| *t).collect();
        assert_eq!(targets, vec![1, 3, 2]);
        assert_eq!(succ[0][0].1.kind, FlowKind::Next);
        assert_eq!(succ[0][1].1.rule_edge, Some(0));
    }

    #[test]
    fn test_mark_reachable_and_serialize() {
        let mut graph = build_graph(&linear(2));
        graph.mark_reachable(&[true, true]);
        assert!(graph.node("q2").unwrap().reachable);
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["entryNode"], "q1");
        assert_eq!(json["nodes"][1]["reachable"], true);
    }
}
