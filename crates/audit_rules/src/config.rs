// Rule Configuration
//
// Thresholds and patterns consumed by the built-in rules. Loaded from the
// project's audit.toml and overridable per run through the bridge.

use serde::{Deserialize, Serialize};

/// Configuration shared by all rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Wall-clock budget for one rule's evaluation, in milliseconds.
    /// Exceeding it adds an error finding (evaluation is not preempted).
    pub rule_budget_ms: u64,
    pub naming: NamingConfig,
    pub complexity: ComplexityConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rule_budget_ms: 2000,
            naming: NamingConfig::default(),
            complexity: ComplexityConfig::default(),
        }
    }
}

/// Naming-convention patterns (wildmatch syntax: `*` and `?`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// An asset name must match at least one of these
    pub asset_patterns: Vec<String>,
    /// Variable names matching any of these are flagged
    pub deny_patterns: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            asset_patterns: vec![
                "BP_*".to_string(),
                "WBP_*".to_string(),
                "ABP_*".to_string(),
            ],
            deny_patterns: vec!["NewVar*".to_string(), "* *".to_string()],
        }
    }
}

/// Complexity thresholds for a single graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    pub max_nodes: usize,
    /// Maximum branch points (Branch nodes plus nodes with more than one
    /// outgoing exec pin)
    pub max_branches: usize,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            max_nodes: 200,
            max_branches: 20,
        }
    }
}
