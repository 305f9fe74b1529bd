// Rule Registry and Engine
//
// Rules are independent, stateless units registered into an ordered list.
// The engine runs every applicable rule over a graph; a rule that panics is
// isolated to a single synthetic error finding and the remaining rules still
// run. Identical graph input yields an identical ordered finding sequence.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, warn};

use audit_graph::{Finding, FindingTarget, Graph, Severity, sort_findings};

use crate::config::RuleConfig;
use crate::rules;

/// Rule id for the synthetic finding produced when a rule panics
pub const RULE_INTERNAL_ERROR: &str = "rule.internal_error";
/// Rule id for the synthetic finding produced when a rule blows its budget
pub const RULE_BUDGET_EXCEEDED: &str = "rule.budget_exceeded";

// ─────────────────────────────────────────────────────────────────────────────
// Rule Trait
// ─────────────────────────────────────────────────────────────────────────────

/// One audit rule
///
/// Rules must be stateless and deterministic: same graph in, same findings
/// out, in the same order.
pub trait Rule: Send + Sync {
    /// Stable rule id (e.g. `rule.unreachable`), part of the wire contract
    fn id(&self) -> &'static str;

    /// Whether this rule has anything to say about the given graph
    fn applicable_to(&self, _graph: &Graph) -> bool {
        true
    }

    /// Evaluate the rule against a graph
    fn evaluate(&self, graph: &Graph, config: &RuleConfig) -> Vec<Finding>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered registry of rules
///
/// Registration order is the tie-break order for findings with equal sort
/// keys.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a registry with all built-in rules registered
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(rules::UnreachableNodes));
        registry.register(Arc::new(rules::DanglingPins));
        registry.register(Arc::new(rules::NamingConventions));
        registry.register(Arc::new(rules::ExcessiveComplexity));
        registry.register(Arc::new(rules::ExpensiveInTick));
        registry
    }

    /// Append a rule
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Registered rules, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Drives rules over graphs with fault isolation
pub struct RuleEngine {
    registry: RuleRegistry,
}

impl RuleEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate every applicable rule against a graph
    ///
    /// Returns findings in stable report order: severity descending, then
    /// rule id, then target; registration order breaks remaining ties.
    pub fn evaluate(&self, graph: &Graph, config: &RuleConfig) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in self.registry.iter() {
            if !rule.applicable_to(graph) {
                continue;
            }

            let started = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(graph, config)));
            let elapsed = started.elapsed();

            match result {
                Ok(mut rule_findings) => findings.append(&mut rule_findings),
                Err(payload) => {
                    error!(
                        rule = rule.id(),
                        graph = %graph.id,
                        asset = %graph.asset_path,
                        "rule panicked: {}",
                        panic_message(payload.as_ref())
                    );
                    findings.push(Finding::new(
                        RULE_INTERNAL_ERROR,
                        Severity::Error,
                        FindingTarget::Graph {
                            graph_id: graph.id.clone(),
                        },
                        format!("rule '{}' failed internally and was skipped", rule.id()),
                    ));
                }
            }

            if elapsed.as_millis() as u64 > config.rule_budget_ms {
                warn!(
                    rule = rule.id(),
                    graph = %graph.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "rule exceeded its evaluation budget"
                );
                // Message must stay timing-free so the fingerprint is stable
                findings.push(Finding::new(
                    RULE_BUDGET_EXCEEDED,
                    Severity::Error,
                    FindingTarget::Graph {
                        graph_id: graph.id.clone(),
                    },
                    format!("rule '{}' exceeded its evaluation budget", rule.id()),
                ));
            }
        }

        sort_findings(&mut findings);
        findings
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
