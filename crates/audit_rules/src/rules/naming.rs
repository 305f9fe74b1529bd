// Naming-convention checks
//
// Two checks: the asset name must match one of the configured prefixes, and
// variable names matching a deny pattern (leftover editor defaults, names
// with spaces) are flagged on their get/set nodes.

use wildmatch::WildMatch;

use audit_graph::{Finding, FindingTarget, Graph, Severity};

use crate::config::RuleConfig;
use crate::registry::Rule;

pub struct NamingConventions;

impl Rule for NamingConventions {
    fn id(&self) -> &'static str {
        "rule.naming"
    }

    fn evaluate(&self, graph: &Graph, config: &RuleConfig) -> Vec<Finding> {
        let mut findings = Vec::new();
        let naming = &config.naming;

        let asset_name = graph.asset_name();
        let asset_ok = naming.asset_patterns.is_empty()
            || naming
                .asset_patterns
                .iter()
                .any(|p| WildMatch::new(p).matches(asset_name));
        if !asset_ok {
            findings.push(Finding::new(
                self.id(),
                Severity::Warning,
                FindingTarget::Graph {
                    graph_id: graph.id.clone(),
                },
                format!(
                    "asset name '{}' does not match any of the expected patterns: {}",
                    asset_name,
                    naming.asset_patterns.join(", ")
                ),
            ));
        }

        let deny: Vec<WildMatch> = naming.deny_patterns.iter().map(|p| WildMatch::new(p)).collect();
        for node in graph.nodes() {
            if !node.kind.is_variable() {
                continue;
            }
            if deny.iter().any(|m| m.matches(&node.name)) {
                findings.push(Finding::new(
                    self.id(),
                    Severity::Info,
                    FindingTarget::Node {
                        graph_id: graph.id.clone(),
                        node_id: node.id.clone(),
                    },
                    format!("variable name '{}' violates naming conventions", node.name),
                ));
            }
        }

        findings
    }
}
