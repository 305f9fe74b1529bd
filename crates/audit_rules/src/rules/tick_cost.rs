// Expensive-operation-in-tick detection
//
// A node tagged `expensive` that is execution-reachable from a per-frame
// event runs every frame. Each expensive node is reported once, against the
// first per-frame event (in discovery order) that reaches it.

use std::collections::BTreeMap;

use audit_graph::{Finding, FindingTarget, Graph, Severity};

use crate::config::RuleConfig;
use crate::registry::Rule;

/// Tag marking events that fire every frame
pub const TAG_PER_FRAME: &str = "per_frame";
/// Tag marking expensive operations
pub const TAG_EXPENSIVE: &str = "expensive";

pub struct ExpensiveInTick;

impl Rule for ExpensiveInTick {
    fn id(&self) -> &'static str {
        "rule.expensive_in_tick"
    }

    fn applicable_to(&self, graph: &Graph) -> bool {
        graph.nodes().iter().any(|n| n.has_tag(TAG_PER_FRAME))
    }

    fn evaluate(&self, graph: &Graph, _config: &RuleConfig) -> Vec<Finding> {
        // expensive node id -> name of the first per-frame event reaching it
        let mut hits: BTreeMap<&str, &str> = BTreeMap::new();

        for event in graph.nodes().iter().filter(|n| n.has_tag(TAG_PER_FRAME)) {
            let reachable = graph.exec_reachable_from([event.id.as_str()]);
            for node_id in &reachable {
                let Some(node) = graph.node(node_id) else {
                    continue;
                };
                if node.has_tag(TAG_EXPENSIVE) {
                    hits.entry(node.id.as_str()).or_insert(event.name.as_str());
                }
            }
        }

        hits.into_iter()
            .filter_map(|(node_id, event_name)| {
                let node = graph.node(node_id)?;
                Some(Finding::new(
                    self.id(),
                    Severity::Warning,
                    FindingTarget::Node {
                        graph_id: graph.id.clone(),
                        node_id: node.id.clone(),
                    },
                    format!(
                        "expensive operation '{}' runs every frame (reachable from '{}')",
                        node.name, event_name
                    ),
                ))
            })
            .collect()
    }
}
