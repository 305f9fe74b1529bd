//! End-to-end audit flows over on-disk blueprint fixtures.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use bpaudit::assets::AssetIndex;
use bpaudit::audit::{Orchestrator, ReportStore, RunState, RunStatus};
use bpaudit::audit_graph::{FindingTarget, Report, Severity};
use bpaudit::audit_rules::{RuleEngine, RuleRegistry};
use bpaudit::config::{AuditConfig, RunOptions};

fn write_blueprint(dir: &Path, file: &str, content: serde_json::Value) {
    let path = dir.join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content.to_string()).unwrap();
}

fn setup(dir: &Path, config: AuditConfig) -> (Orchestrator, Arc<ReportStore>, Arc<AssetIndex>) {
    let index = Arc::new(AssetIndex::scan(dir).unwrap());
    let store = Arc::new(ReportStore::new(config.run.retain_runs));
    let engine = Arc::new(RuleEngine::new(RuleRegistry::builtin()));
    let orchestrator = Orchestrator::new(
        Arc::clone(&index),
        Arc::clone(&store),
        engine,
        Arc::new(config),
    );
    (orchestrator, store, index)
}

async fn wait_terminal(orchestrator: &Orchestrator, run_id: Uuid) -> RunStatus {
    for _ in 0..2000 {
        let status = orchestrator.run_status(run_id).unwrap();
        if status.state.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("run {} did not reach a terminal state", run_id);
}

async fn audit_and_fetch(
    orchestrator: &Orchestrator,
    store: &ReportStore,
    asset: &str,
) -> Arc<Report> {
    let run_id = orchestrator
        .start_run(vec![asset.to_string()], RunOptions::default())
        .unwrap();
    let status = wait_terminal(orchestrator, run_id).await;
    assert_eq!(status.state, RunState::Completed);
    store.get(asset).unwrap()
}

fn tick_trace_blueprint() -> serde_json::Value {
    json!({
        "name": "BP_Player",
        "graphs": [{
            "id": "EventGraph",
            "nodes": [
                {
                    "id": "tick", "type": "Event", "name": "EventTick",
                    "pins": [{"name": "then", "direction": "output", "kind": "exec"}]
                },
                {
                    "id": "trace", "type": "CallFunction", "name": "ExpensiveTrace",
                    "tags": ["expensive"],
                    "pins": [{"name": "exec", "direction": "input", "kind": "exec"}]
                }
            ],
            "connections": [{"from": "tick.then", "to": "trace.exec"}]
        }]
    })
}

#[tokio::test]
async fn test_expensive_node_wired_to_tick_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    write_blueprint(dir.path(), "BP_Player.bp.json", tick_trace_blueprint());

    let (orchestrator, store, _index) = setup(dir.path(), AuditConfig::default());
    let report = audit_and_fetch(&orchestrator, &store, "/Game/BP_Player").await;

    let hits: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "rule.expensive_in_tick")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Warning);
    assert_eq!(
        hits[0].target,
        FindingTarget::Node {
            graph_id: "EventGraph".to_string(),
            node_id: "trace".to_string(),
        }
    );
}

#[tokio::test]
async fn test_report_json_roundtrip_preserves_finding_order() {
    let dir = tempfile::tempdir().unwrap();
    write_blueprint(dir.path(), "BP_Player.bp.json", tick_trace_blueprint());

    let (orchestrator, store, _index) = setup(dir.path(), AuditConfig::default());
    let report = audit_and_fetch(&orchestrator, &store, "/Game/BP_Player").await;

    let json = serde_json::to_string(&*report).unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.findings, report.findings);
    assert_eq!(parsed.asset_path, report.asset_path);
    assert_eq!(parsed.run_id, report.run_id);
}

/// Connecting a previously dangling pin removes only that finding; the
/// fingerprints of unrelated findings do not move between runs.
#[tokio::test]
async fn test_connecting_dangling_pin_clears_finding_and_keeps_others_stable() {
    fn blueprint(connected: bool) -> serde_json::Value {
        let mut connections = vec![json!({"from": "begin.then", "to": "call.exec"})];
        if connected {
            connections.push(json!({"from": "getter.value", "to": "call.target"}));
        }
        json!({
            "name": "BP_Door",
            "graphs": [{
                "id": "EventGraph",
                "nodes": [
                    {
                        "id": "begin", "type": "Event", "name": "BeginPlay",
                        "pins": [{"name": "then", "direction": "output", "kind": "exec"}]
                    },
                    {
                        "id": "call", "type": "CallFunction", "name": "OpenDoor",
                        "pins": [
                            {"name": "exec", "direction": "input", "kind": "exec"},
                            {
                                "name": "target", "direction": "input", "kind": "data",
                                "data_type": "object", "required": true
                            }
                        ]
                    },
                    {
                        "id": "getter", "type": "VariableGet", "name": "NewVar_0",
                        "pins": [{
                            "name": "value", "direction": "output", "kind": "data",
                            "data_type": "object"
                        }]
                    }
                ],
                "connections": connections
            }]
        })
    }

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("BP_Door.bp.json");
    write_blueprint(dir.path(), "BP_Door.bp.json", blueprint(false));

    let (orchestrator, store, index) = setup(dir.path(), AuditConfig::default());
    let before = audit_and_fetch(&orchestrator, &store, "/Game/BP_Door").await;

    let dangling: Vec<_> = before
        .findings
        .iter()
        .filter(|f| f.rule_id == "rule.dangling_pin")
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].severity, Severity::Error);

    // The sloppy variable name is flagged independently of the wiring
    let naming_before: Vec<_> = before
        .findings
        .iter()
        .filter(|f| f.rule_id == "rule.naming")
        .cloned()
        .collect();
    assert!(!naming_before.is_empty());

    // Editor connects the pin and saves
    std::fs::write(&file, blueprint(true).to_string()).unwrap();
    index.refresh(&file);

    let after = audit_and_fetch(&orchestrator, &store, "/Game/BP_Door").await;
    assert!(
        after
            .findings
            .iter()
            .all(|f| f.rule_id != "rule.dangling_pin")
    );

    let naming_after: Vec<_> = after
        .findings
        .iter()
        .filter(|f| f.rule_id == "rule.naming")
        .cloned()
        .collect();
    assert_eq!(
        naming_before
            .iter()
            .map(|f| f.fingerprint.as_str())
            .collect::<Vec<_>>(),
        naming_after
            .iter()
            .map(|f| f.fingerprint.as_str())
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..300 {
        write_blueprint(
            dir.path(),
            &format!("BP_Gen{:03}.bp.json", i),
            json!({
                "name": format!("BP_Gen{:03}", i),
                "graphs": [{
                    "id": "EventGraph",
                    "nodes": [{
                        "id": "e1", "type": "Event", "name": "BeginPlay",
                        "pins": [{"name": "then", "direction": "output", "kind": "exec"}]
                    }],
                    "connections": []
                }]
            }),
        );
    }

    let mut config = AuditConfig::default();
    config.run.workers = 1;
    let (orchestrator, store, _index) = setup(dir.path(), config);

    let run_id = orchestrator
        .start_run(Vec::new(), RunOptions::default())
        .unwrap();

    // Let a few assets finish, then cancel mid-run
    loop {
        let status = orchestrator.run_status(run_id).unwrap();
        if status.progress.done >= 3 {
            break;
        }
        assert!(!status.state.is_terminal(), "run finished before cancel");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    orchestrator.cancel_run(run_id).unwrap();

    let status = wait_terminal(&orchestrator, run_id).await;
    assert_eq!(status.state, RunState::Cancelled);
    assert!(status.progress.done >= 3);
    assert!(status.progress.done < status.progress.total);

    // Exactly the assets processed before cancellation have reports
    let reports = store.list(run_id).unwrap();
    assert_eq!(reports.len(), status.progress.done);
}

#[tokio::test]
async fn test_empty_scope_audits_every_indexed_asset() {
    let dir = tempfile::tempdir().unwrap();
    write_blueprint(dir.path(), "BP_Player.bp.json", tick_trace_blueprint());
    write_blueprint(
        dir.path(),
        "UI/WBP_Menu.bp.json",
        json!({"name": "WBP_Menu", "graphs": []}),
    );

    let (orchestrator, store, _index) = setup(dir.path(), AuditConfig::default());
    let run_id = orchestrator
        .start_run(Vec::new(), RunOptions::default())
        .unwrap();
    let status = wait_terminal(&orchestrator, run_id).await;

    assert_eq!(status.state, RunState::Completed);
    assert_eq!(status.progress.total, 2);
    assert!(store.get("/Game/BP_Player").is_some());
    assert!(store.get("/Game/UI/WBP_Menu").is_some());
}
