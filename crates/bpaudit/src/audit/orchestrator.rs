// Audit Orchestrator
//
// Owns the run lifecycle. Runs are submitted to a bounded queue consumed by
// a single driver task, so at most one run is active per process; a full
// queue is reported as RunBusy. Within a run, per-asset audits fan out over
// a bounded worker pool and produce independent reports that only meet in
// the store. Cancellation is cooperative and checked at asset boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use audit_graph::Report;
use audit_rules::{RuleConfig, RuleEngine};

use crate::assets::AssetIndex;
use crate::audit::ReportStore;
use crate::config::{AuditConfig, RunOptions};

// ─────────────────────────────────────────────────────────────────────────────
// Run State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed | RunState::Cancelled)
    }
}

/// Progress of a run, in assets
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunProgress {
    pub done: usize,
    pub total: usize,
}

/// Serializable view of a run for the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub run_id: Uuid,
    pub state: RunState,
    pub progress: RunProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

struct RunRecord {
    id: Uuid,
    scope: Vec<String>,
    options: RunOptions,
    state: Mutex<RunState>,
    done: AtomicUsize,
    total: AtomicUsize,
    cancelled: AtomicBool,
    started_at: Mutex<Option<DateTime<Utc>>>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
}

impl RunRecord {
    fn new(scope: Vec<String>, options: RunOptions) -> Self {
        let total = scope.len();
        Self {
            id: Uuid::new_v4(),
            scope,
            options,
            state: Mutex::new(RunState::Queued),
            done: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
            cancelled: AtomicBool::new(false),
            started_at: Mutex::new(None),
            finished_at: Mutex::new(None),
        }
    }

    fn status(&self) -> RunStatus {
        RunStatus {
            run_id: self.id,
            state: *self.state.lock(),
            progress: RunProgress {
                done: self.done.load(Ordering::Relaxed),
                total: self.total.load(Ordering::Relaxed),
            },
            started_at: *self.started_at.lock(),
            finished_at: *self.finished_at.lock(),
        }
    }

    fn finish(&self, state: RunState) {
        *self.state.lock() = state;
        *self.finished_at.lock() = Some(Utc::now());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced to bridge callers
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("an audit run is already active and the queue is full")]
    RunBusy,

    #[error("run not found: {0}")]
    NotFound(Uuid),

    #[error("audit orchestrator is shut down")]
    Shutdown,
}

struct OrchestratorInner {
    runs: DashMap<Uuid, Arc<RunRecord>>,
    latest: Mutex<Option<Uuid>>,
    queue_tx: mpsc::Sender<Arc<RunRecord>>,
}

/// Handle to the audit orchestrator
///
/// Cheap to clone; all clones share the same run queue and run table.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

impl Orchestrator {
    /// Create the orchestrator and spawn its driver task
    pub fn new(
        index: Arc<AssetIndex>,
        store: Arc<ReportStore>,
        engine: Arc<RuleEngine>,
        config: Arc<AuditConfig>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.run.queue_depth.max(1));

        tokio::spawn(drive_runs(queue_rx, index, store, engine, config));

        Self {
            inner: Arc::new(OrchestratorInner {
                runs: DashMap::new(),
                latest: Mutex::new(None),
                queue_tx,
            }),
        }
    }

    /// Queue a run over the given scope (empty scope = all indexed assets)
    ///
    /// Fails with `RunBusy` when a run is active and the queue is full.
    pub fn start_run(
        &self,
        scope: Vec<String>,
        options: RunOptions,
    ) -> Result<Uuid, OrchestratorError> {
        let record = Arc::new(RunRecord::new(scope, options));
        let run_id = record.id;

        match self.inner.queue_tx.try_send(Arc::clone(&record)) {
            Ok(()) => {
                self.inner.runs.insert(run_id, record);
                *self.inner.latest.lock() = Some(run_id);
                info!("Queued audit run {}", run_id);
                Ok(run_id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(OrchestratorError::RunBusy),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(OrchestratorError::Shutdown),
        }
    }

    /// Request cooperative cancellation of a run
    ///
    /// Takes effect at the next asset boundary; reports already stored
    /// remain available. Cancelling a terminal run is a no-op.
    pub fn cancel_run(&self, run_id: Uuid) -> Result<(), OrchestratorError> {
        let record = self
            .inner
            .runs
            .get(&run_id)
            .ok_or(OrchestratorError::NotFound(run_id))?;

        record.cancelled.store(true, Ordering::Relaxed);

        let mut state = record.state.lock();
        if *state == RunState::Queued {
            *state = RunState::Cancelled;
            *record.finished_at.lock() = Some(Utc::now());
        }
        info!("Cancellation requested for run {}", run_id);
        Ok(())
    }

    /// Status of a run, if known
    pub fn run_status(&self, run_id: Uuid) -> Option<RunStatus> {
        self.inner.runs.get(&run_id).map(|r| r.status())
    }

    /// Status of the most recently submitted run
    pub fn latest_run(&self) -> Option<RunStatus> {
        let id = (*self.inner.latest.lock())?;
        self.run_status(id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver
// ─────────────────────────────────────────────────────────────────────────────

/// Consume queued runs one at a time
async fn drive_runs(
    mut queue_rx: mpsc::Receiver<Arc<RunRecord>>,
    index: Arc<AssetIndex>,
    store: Arc<ReportStore>,
    engine: Arc<RuleEngine>,
    config: Arc<AuditConfig>,
) {
    while let Some(record) = queue_rx.recv().await {
        if record.state.lock().is_terminal() {
            // Cancelled while queued
            continue;
        }
        execute_run(&record, &index, &store, &engine, &config).await;
    }
}

/// Execute one run to a terminal state
async fn execute_run(
    record: &Arc<RunRecord>,
    index: &Arc<AssetIndex>,
    store: &Arc<ReportStore>,
    engine: &Arc<RuleEngine>,
    config: &Arc<AuditConfig>,
) {
    *record.state.lock() = RunState::Running;
    *record.started_at.lock() = Some(Utc::now());

    let scope = if record.scope.is_empty() {
        index.list()
    } else {
        record.scope.clone()
    };
    record.total.store(scope.len(), Ordering::Relaxed);

    let rules = record
        .options
        .rules
        .clone()
        .unwrap_or_else(|| config.rules.clone());
    let incremental = record
        .options
        .incremental
        .unwrap_or(config.run.incremental);
    let rules = Arc::new(rules);

    info!(
        "Starting audit run {} over {} asset(s)",
        record.id,
        scope.len()
    );

    let outcomes: Vec<AssetOutcome> = futures::stream::iter(scope)
        .map(|asset| {
            let record = Arc::clone(record);
            let index = Arc::clone(index);
            let store = Arc::clone(store);
            let engine = Arc::clone(engine);
            let rules = Arc::clone(&rules);
            async move {
                // Asset boundary: the only cancellation check point
                if record.cancelled.load(Ordering::Relaxed) {
                    return AssetOutcome::Skipped;
                }

                let run_id = record.id;
                let prev_reports = Arc::clone(&store);
                let result = tokio::task::spawn_blocking(move || {
                    if incremental {
                        if let Some(prev) = unchanged_report(&index, &prev_reports, &asset) {
                            return prev.carried_forward(run_id);
                        }
                    }
                    audit_asset(&index, &engine, &rules, &asset, run_id)
                })
                .await;

                match result {
                    Ok(report) => {
                        store.insert(report);
                        record.done.fetch_add(1, Ordering::Relaxed);
                        AssetOutcome::Done
                    }
                    Err(e) => {
                        warn!("Audit task failed for run {}: {}", run_id, e);
                        AssetOutcome::TaskFailed
                    }
                }
            }
        })
        .buffer_unordered(config.run.workers.max(1))
        .collect()
        .await;

    let final_state = if record.cancelled.load(Ordering::Relaxed) {
        RunState::Cancelled
    } else if outcomes.iter().any(|o| *o == AssetOutcome::TaskFailed) {
        RunState::Failed
    } else {
        RunState::Completed
    };
    record.finish(final_state);

    info!(
        "Audit run {} finished: {:?} ({}/{} assets)",
        record.id,
        final_state,
        record.done.load(Ordering::Relaxed),
        record.total.load(Ordering::Relaxed)
    );
}

#[derive(Debug, PartialEq, Eq)]
enum AssetOutcome {
    Done,
    Skipped,
    TaskFailed,
}

/// Previous report to carry forward if the asset is unchanged on disk
fn unchanged_report(
    index: &AssetIndex,
    store: &ReportStore,
    asset_path: &str,
) -> Option<Report> {
    let prev = store.get(asset_path)?;
    if prev.error.is_some() {
        return None;
    }
    let current = index.source_hash(asset_path).ok()?;
    (current == prev.source_hash).then(|| (*prev).clone())
}

/// Audit one asset: adapter pass, then every graph through the rule engine
///
/// Adapter failures become an error-marker report; they never propagate.
pub fn audit_asset(
    index: &AssetIndex,
    engine: &RuleEngine,
    rules: &RuleConfig,
    asset_path: &str,
    run_id: Uuid,
) -> Report {
    match index.read_snapshot(asset_path) {
        Ok(snapshot) => {
            let mut findings = Vec::new();
            let mut graph_ids = Vec::with_capacity(snapshot.graphs.len());
            for graph in &snapshot.graphs {
                findings.extend(engine.evaluate(graph, rules));
                graph_ids.push(graph.id.clone());
            }
            Report::new(asset_path, run_id, graph_ids, snapshot.source_hash, findings)
        }
        Err(e) => {
            warn!("Failed to audit {}: {}", asset_path, e);
            Report::failed(asset_path, run_id, e.to_string())
        }
    }
}
