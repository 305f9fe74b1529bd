// Unreachable node detection
//
// A node that participates in execution flow but has no execution-edge path
// from any entry node will never run. Pure data nodes (no exec pins) are
// evaluated on demand and are exempt.

use audit_graph::{Finding, FindingTarget, Graph, Severity};

use crate::config::RuleConfig;
use crate::registry::Rule;

pub struct UnreachableNodes;

impl Rule for UnreachableNodes {
    fn id(&self) -> &'static str {
        "rule.unreachable"
    }

    fn applicable_to(&self, graph: &Graph) -> bool {
        graph.nodes().iter().any(|n| graph.has_any_exec_pin(&n.id))
    }

    fn evaluate(&self, graph: &Graph, _config: &RuleConfig) -> Vec<Finding> {
        let entries: Vec<&str> = graph.entry_nodes().iter().map(|n| n.id.as_str()).collect();
        let reachable = graph.exec_reachable_from(entries);

        graph
            .nodes()
            .iter()
            .filter(|n| graph.has_any_exec_pin(&n.id) && !reachable.contains(&n.id))
            .map(|n| {
                Finding::new(
                    self.id(),
                    Severity::Warning,
                    FindingTarget::Node {
                        graph_id: graph.id.clone(),
                        node_id: n.id.clone(),
                    },
                    format!("node '{}' is not reachable from any event node", n.name),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_graph::{GraphBuilder, NodeKind, PinDirection};

    fn graph_with_orphan() -> Graph {
        let mut b = GraphBuilder::new("EventGraph", "/Game/BP_Test");
        b.add_node("e1", NodeKind::Event, "BeginPlay", []).unwrap();
        b.add_node("f1", NodeKind::FunctionCall, "Connected", []).unwrap();
        b.add_node("f2", NodeKind::FunctionCall, "Orphan", []).unwrap();
        b.add_node("pure", NodeKind::VariableGet, "Health", []).unwrap();
        b.add_exec_pin("e1", "then", PinDirection::Output).unwrap();
        b.add_exec_pin("f1", "exec", PinDirection::Input).unwrap();
        b.add_exec_pin("f2", "exec", PinDirection::Input).unwrap();
        b.add_data_pin("pure", "value", PinDirection::Output, None, false)
            .unwrap();
        b.add_edge("e1.then", "f1.exec").unwrap();
        b.build()
    }

    #[test]
    fn test_orphan_is_reported() {
        let findings = UnreachableNodes.evaluate(&graph_with_orphan(), &RuleConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].target,
            FindingTarget::Node {
                graph_id: "EventGraph".to_string(),
                node_id: "f2".to_string(),
            }
        );
    }

    #[test]
    fn test_reachable_node_is_never_reported() {
        let findings = UnreachableNodes.evaluate(&graph_with_orphan(), &RuleConfig::default());
        assert!(!findings.iter().any(|f| matches!(
            &f.target,
            FindingTarget::Node { node_id, .. } if node_id == "f1" || node_id == "e1"
        )));
    }

    #[test]
    fn test_pure_data_node_is_exempt() {
        let findings = UnreachableNodes.evaluate(&graph_with_orphan(), &RuleConfig::default());
        assert!(!findings.iter().any(|f| matches!(
            &f.target,
            FindingTarget::Node { node_id, .. } if node_id == "pure"
        )));
    }

    #[test]
    fn test_not_applicable_to_pure_graphs() {
        let mut b = GraphBuilder::new("g", "/Game/BP_Pure");
        b.add_node("v", NodeKind::VariableGet, "X", []).unwrap();
        b.add_data_pin("v", "value", PinDirection::Output, None, false)
            .unwrap();
        assert!(!UnreachableNodes.applicable_to(&b.build()));
    }
}
