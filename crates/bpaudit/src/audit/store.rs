// Report Store
//
// Holds the most recent report per asset plus per-run report buckets with
// bounded retention. Reports are immutable once stored; the store only ever
// hands out Arcs.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use audit_graph::Report;

struct RunBucket {
    run_id: Uuid,
    reports: Vec<Arc<Report>>,
}

/// Store of audit reports
pub struct ReportStore {
    /// Most recent report per asset, independent of bucket retention
    latest: DashMap<String, Arc<Report>>,
    /// Per-run buckets, oldest first
    runs: Mutex<VecDeque<RunBucket>>,
    retain_runs: usize,
}

impl ReportStore {
    /// Create a store keeping reports for the last `retain_runs` runs
    pub fn new(retain_runs: usize) -> Self {
        Self {
            latest: DashMap::new(),
            runs: Mutex::new(VecDeque::new()),
            retain_runs: retain_runs.max(1),
        }
    }

    /// Store a report, replacing any previous report for the same asset
    /// within the same run
    pub fn insert(&self, report: Report) {
        let report = Arc::new(report);
        self.latest
            .insert(report.asset_path.clone(), Arc::clone(&report));

        let mut runs = self.runs.lock();
        if let Some(bucket) = runs.iter_mut().find(|b| b.run_id == report.run_id) {
            match bucket
                .reports
                .iter_mut()
                .find(|r| r.asset_path == report.asset_path)
            {
                Some(slot) => *slot = report,
                None => bucket.reports.push(report),
            }
            return;
        }

        runs.push_back(RunBucket {
            run_id: report.run_id,
            reports: vec![report],
        });

        // Strict oldest-run-first eviction
        while runs.len() > self.retain_runs {
            if let Some(evicted) = runs.pop_front() {
                debug!(
                    "Evicting {} report(s) of run {}",
                    evicted.reports.len(),
                    evicted.run_id
                );
            }
        }
    }

    /// Most recent report for an asset
    pub fn get(&self, asset_path: &str) -> Option<Arc<Report>> {
        self.latest.get(asset_path).map(|r| Arc::clone(&r))
    }

    /// All reports of one run, sorted by asset path
    ///
    /// Returns None for runs the store has never seen (or has evicted).
    pub fn list(&self, run_id: Uuid) -> Option<Vec<Arc<Report>>> {
        let runs = self.runs.lock();
        let bucket = runs.iter().find(|b| b.run_id == run_id)?;
        let mut reports = bucket.reports.clone();
        reports.sort_by(|a, b| a.asset_path.cmp(&b.asset_path));
        Some(reports)
    }

    /// Number of retained run buckets
    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(asset: &str, run_id: Uuid) -> Report {
        Report::new(asset, run_id, vec![], "hash", vec![])
    }

    #[test]
    fn test_get_returns_latest() {
        let store = ReportStore::new(4);
        let run1 = Uuid::new_v4();
        let run2 = Uuid::new_v4();

        store.insert(report("/Game/BP_A", run1));
        store.insert(report("/Game/BP_A", run2));

        assert_eq!(store.get("/Game/BP_A").unwrap().run_id, run2);
        assert!(store.get("/Game/BP_B").is_none());
    }

    #[test]
    fn test_one_report_per_asset_per_run() {
        let store = ReportStore::new(4);
        let run = Uuid::new_v4();

        store.insert(report("/Game/BP_A", run));
        store.insert(report("/Game/BP_A", run));
        store.insert(report("/Game/BP_B", run));

        assert_eq!(store.list(run).unwrap().len(), 2);
    }

    #[test]
    fn test_retention_evicts_oldest_first() {
        let store = ReportStore::new(2);
        let runs: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        for run in &runs {
            store.insert(report("/Game/BP_A", *run));
        }

        assert_eq!(store.run_count(), 2);
        assert!(store.list(runs[0]).is_none());
        assert!(store.list(runs[1]).is_some());
        assert!(store.list(runs[2]).is_some());

        // Latest-per-asset survives eviction
        assert_eq!(store.get("/Game/BP_A").unwrap().run_id, runs[2]);
    }

    #[test]
    fn test_list_is_sorted_by_asset_path() {
        let store = ReportStore::new(4);
        let run = Uuid::new_v4();
        store.insert(report("/Game/BP_B", run));
        store.insert(report("/Game/BP_A", run));

        let paths: Vec<_> = store
            .list(run)
            .unwrap()
            .iter()
            .map(|r| r.asset_path.clone())
            .collect();
        assert_eq!(paths, vec!["/Game/BP_A", "/Game/BP_B"]);
    }
}
