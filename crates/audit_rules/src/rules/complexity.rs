// Excessive-complexity check
//
// Flags graphs that are too big to review: total node count over the
// threshold, or too many branch points (Branch nodes plus any node with
// more than one outgoing exec pin).

use audit_graph::{Finding, FindingTarget, Graph, NodeKind, PinDirection, PinKind, Severity};

use crate::config::RuleConfig;
use crate::registry::Rule;

pub struct ExcessiveComplexity;

impl ExcessiveComplexity {
    fn branch_count(graph: &Graph) -> usize {
        graph
            .nodes()
            .iter()
            .filter(|n| {
                if n.kind == NodeKind::Branch {
                    return true;
                }
                let exec_outs = graph
                    .node_pins(&n.id)
                    .filter(|p| p.kind == PinKind::Exec && p.direction == PinDirection::Output)
                    .count();
                exec_outs > 1
            })
            .count()
    }
}

impl Rule for ExcessiveComplexity {
    fn id(&self) -> &'static str {
        "rule.complexity"
    }

    fn evaluate(&self, graph: &Graph, config: &RuleConfig) -> Vec<Finding> {
        let limits = &config.complexity;
        let mut findings = Vec::new();

        let node_count = graph.nodes().len();
        if node_count > limits.max_nodes {
            findings.push(Finding::new(
                self.id(),
                Severity::Warning,
                FindingTarget::Graph {
                    graph_id: graph.id.clone(),
                },
                format!(
                    "graph has {} nodes (limit {}), consider splitting it into functions",
                    node_count, limits.max_nodes
                ),
            ));
        }

        let branches = Self::branch_count(graph);
        if branches > limits.max_branches {
            findings.push(Finding::new(
                self.id(),
                Severity::Warning,
                FindingTarget::Graph {
                    graph_id: graph.id.clone(),
                },
                format!(
                    "graph has {} branch points (limit {})",
                    branches, limits.max_branches
                ),
            ));
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_graph::GraphBuilder;
    use crate::config::ComplexityConfig;

    fn config(max_nodes: usize, max_branches: usize) -> RuleConfig {
        RuleConfig {
            complexity: ComplexityConfig {
                max_nodes,
                max_branches,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_node_count_threshold() {
        let mut b = GraphBuilder::new("g", "/Game/BP_Big");
        for i in 0..5 {
            b.add_node(&format!("n{}", i), NodeKind::FunctionCall, "F", [])
                .unwrap();
        }
        let graph = b.build();

        assert!(ExcessiveComplexity.evaluate(&graph, &config(4, 100)).len() == 1);
        assert!(ExcessiveComplexity.evaluate(&graph, &config(5, 100)).is_empty());
    }

    #[test]
    fn test_branch_count_counts_multi_exec_outputs() {
        let mut b = GraphBuilder::new("g", "/Game/BP_Branchy");
        b.add_node("b1", NodeKind::Branch, "Branch", []).unwrap();
        b.add_node("sw", NodeKind::Other("Switch".into()), "Switch", [])
            .unwrap();
        b.add_exec_pin("sw", "case_a", PinDirection::Output).unwrap();
        b.add_exec_pin("sw", "case_b", PinDirection::Output).unwrap();
        let graph = b.build();

        // Branch node + switch node with two exec outputs = 2 branch points
        let findings = ExcessiveComplexity.evaluate(&graph, &config(100, 1));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("2 branch points"));
    }
}
