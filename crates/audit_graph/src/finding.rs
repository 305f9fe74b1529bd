// Findings and Reports
//
// A Finding is one issue produced by a rule against a graph, node, pin or
// edge. Findings are aggregated per asset into a Report. Both serialize to
// the camelCase wire format used by the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Severity of a finding
///
/// Variant order matters: it is the sort order (ascending), so reports can
/// order findings by severity descending with `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What a finding points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FindingTarget {
    /// The graph as a whole
    Graph { graph_id: String },
    /// A single node
    Node { graph_id: String, node_id: String },
    /// A single pin
    Pin {
        graph_id: String,
        node_id: String,
        pin: String,
    },
    /// A single edge
    Edge {
        graph_id: String,
        from: String,
        to: String,
    },
}

impl FindingTarget {
    /// Canonical string form, used for fingerprints and stable sorting
    pub fn canonical(&self) -> String {
        match self {
            FindingTarget::Graph { graph_id } => format!("graph:{}", graph_id),
            FindingTarget::Node { graph_id, node_id } => {
                format!("node:{}/{}", graph_id, node_id)
            }
            FindingTarget::Pin {
                graph_id,
                node_id,
                pin,
            } => format!("pin:{}/{}.{}", graph_id, node_id, pin),
            FindingTarget::Edge { graph_id, from, to } => {
                format!("edge:{}/{}->{}", graph_id, from, to)
            }
        }
    }
}

/// One issue reported by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Id of the rule that produced this finding (e.g. `rule.unreachable`)
    pub rule_id: String,
    pub severity: Severity,
    pub target: FindingTarget,
    /// Human-readable message
    pub message: String,
    /// Stable hash of rule id + target + message, used for deduplication
    /// and diffing between runs
    pub fingerprint: String,
}

impl Finding {
    /// Create a finding, computing its fingerprint
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        target: FindingTarget,
        message: impl Into<String>,
    ) -> Self {
        let rule_id = rule_id.into();
        let message = message.into();
        let fingerprint = fingerprint(&rule_id, &target, &message);
        Self {
            rule_id,
            severity,
            target,
            message,
            fingerprint,
        }
    }
}

/// Compute a finding fingerprint: first 16 hex chars of
/// `sha256(rule_id \n target \n message)`
pub fn fingerprint(rule_id: &str, target: &FindingTarget, message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(target.canonical().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Sort findings into report order: severity descending, then rule id,
/// then target. The sort is stable, so registration order breaks ties.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.target.canonical().cmp(&b.target.canonical()))
    });
}

/// Audit report for one asset within one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Path of the audited asset
    pub asset_path: String,
    /// Run this report belongs to
    pub run_id: Uuid,
    /// Ids of the graphs that were audited
    pub graph_ids: Vec<String>,
    /// Hash of the asset source file at audit time, for stale detection
    pub source_hash: String,
    pub timestamp: DateTime<Utc>,
    /// Findings in stable report order
    pub findings: Vec<Finding>,
    /// Set when the asset could not be audited (adapter failure etc.);
    /// such a report carries no findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Create a report from accumulated findings, sorting and deduplicating
    /// them by fingerprint (first occurrence wins)
    pub fn new(
        asset_path: impl Into<String>,
        run_id: Uuid,
        graph_ids: Vec<String>,
        source_hash: impl Into<String>,
        mut findings: Vec<Finding>,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        findings.retain(|f| seen.insert(f.fingerprint.clone()));
        sort_findings(&mut findings);
        Self {
            asset_path: asset_path.into(),
            run_id,
            graph_ids,
            source_hash: source_hash.into(),
            timestamp: Utc::now(),
            findings,
            error: None,
        }
    }

    /// Create a report marking a failed per-asset audit
    pub fn failed(asset_path: impl Into<String>, run_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            run_id,
            graph_ids: Vec::new(),
            source_hash: String::new(),
            timestamp: Utc::now(),
            findings: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Re-stamp an unchanged report for a new run (incremental re-audit)
    pub fn carried_forward(&self, run_id: Uuid) -> Self {
        let mut report = self.clone();
        report.run_id = run_id;
        report.timestamp = Utc::now();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_target(node: &str) -> FindingTarget {
        FindingTarget::Node {
            graph_id: "EventGraph".to_string(),
            node_id: node.to_string(),
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Finding::new("rule.x", Severity::Warning, node_target("n1"), "msg");
        let b = Finding::new("rule.x", Severity::Warning, node_target("n1"), "msg");
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 16);

        let c = Finding::new("rule.x", Severity::Warning, node_target("n2"), "msg");
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_sort_order() {
        let mut findings = vec![
            Finding::new("rule.b", Severity::Info, node_target("n1"), "info"),
            Finding::new("rule.a", Severity::Warning, node_target("n2"), "warn"),
            Finding::new("rule.a", Severity::Error, node_target("n1"), "err"),
            Finding::new("rule.a", Severity::Warning, node_target("n1"), "warn"),
        ];
        sort_findings(&mut findings);

        let keys: Vec<_> = findings
            .iter()
            .map(|f| (f.severity, f.rule_id.as_str(), f.target.canonical()))
            .collect();
        assert_eq!(keys[0].0, Severity::Error);
        assert_eq!(keys[1], (Severity::Warning, "rule.a", "node:EventGraph/n1".into()));
        assert_eq!(keys[2], (Severity::Warning, "rule.a", "node:EventGraph/n2".into()));
        assert_eq!(keys[3].0, Severity::Info);
    }

    #[test]
    fn test_report_dedupes_by_fingerprint() {
        let findings = vec![
            Finding::new("rule.x", Severity::Warning, node_target("n1"), "msg"),
            Finding::new("rule.x", Severity::Warning, node_target("n1"), "msg"),
        ];
        let report = Report::new("/Game/BP_Test", Uuid::new_v4(), vec![], "hash", findings);
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let findings = vec![
            Finding::new("rule.a", Severity::Error, node_target("n1"), "broken"),
            Finding::new(
                "rule.b",
                Severity::Info,
                FindingTarget::Graph {
                    graph_id: "EventGraph".to_string(),
                },
                "note",
            ),
        ];
        let report = Report::new(
            "/Game/BP_Test",
            Uuid::new_v4(),
            vec!["EventGraph".to_string()],
            "hash",
            findings,
        );

        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.asset_path, report.asset_path);
        assert_eq!(parsed.findings, report.findings);

        // Wire format uses camelCase keys
        assert!(json.contains("\"assetPath\""));
        assert!(json.contains("\"ruleId\""));
        assert!(json.contains("\"fingerprint\""));
    }
}
