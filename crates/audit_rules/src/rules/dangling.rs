// Dangling pin detection
//
// A required data input pin with no incoming connection (and no default
// value, which the adapter already folds into `required`) means the node
// will run with a missing input.

use audit_graph::{Finding, FindingTarget, Graph, PinDirection, PinKind, Severity};

use crate::config::RuleConfig;
use crate::registry::Rule;

pub struct DanglingPins;

impl Rule for DanglingPins {
    fn id(&self) -> &'static str {
        "rule.dangling_pin"
    }

    fn evaluate(&self, graph: &Graph, _config: &RuleConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for node in graph.nodes() {
            for pin in graph.node_pins(&node.id) {
                if pin.direction != PinDirection::Input
                    || pin.kind != PinKind::Data
                    || !pin.required
                    || !pin.edges.is_empty()
                {
                    continue;
                }
                findings.push(Finding::new(
                    self.id(),
                    Severity::Error,
                    FindingTarget::Pin {
                        graph_id: graph.id.clone(),
                        node_id: node.id.clone(),
                        pin: pin.name.clone(),
                    },
                    format!(
                        "required input pin '{}' on node '{}' is not connected",
                        pin.name, node.name
                    ),
                ));
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_graph::{GraphBuilder, NodeKind};

    fn graph(connect: bool) -> Graph {
        let mut b = GraphBuilder::new("EventGraph", "/Game/BP_Test");
        b.add_node("src", NodeKind::VariableGet, "Health", []).unwrap();
        b.add_node("sink", NodeKind::FunctionCall, "SetHealth", []).unwrap();
        b.add_data_pin("src", "value", PinDirection::Output, Some("float".into()), false)
            .unwrap();
        b.add_data_pin("sink", "amount", PinDirection::Input, Some("float".into()), true)
            .unwrap();
        b.add_data_pin("sink", "label", PinDirection::Input, Some("string".into()), false)
            .unwrap();
        if connect {
            b.add_edge("src.value", "sink.amount").unwrap();
        }
        b.build()
    }

    #[test]
    fn test_unconnected_required_pin_is_reported() {
        let findings = DanglingPins.evaluate(&graph(false), &RuleConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].target,
            FindingTarget::Pin {
                graph_id: "EventGraph".to_string(),
                node_id: "sink".to_string(),
                pin: "amount".to_string(),
            }
        );
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_connected_pin_is_clean() {
        let findings = DanglingPins.evaluate(&graph(true), &RuleConfig::default());
        assert!(findings.is_empty());
    }

    #[test]
    fn test_optional_pin_is_ignored() {
        // "label" is optional and unconnected in both variants
        let findings = DanglingPins.evaluate(&graph(false), &RuleConfig::default());
        assert!(!findings.iter().any(|f| matches!(
            &f.target,
            FindingTarget::Pin { pin, .. } if pin == "label"
        )));
    }
}
