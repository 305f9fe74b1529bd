// Asset File Watcher
//
// Watches the project directory and enqueues a single-asset audit run when
// a blueprint file changes, mirroring how the host editor re-audits on
// save. Busy-queue rejections are logged and dropped; the next save will
// try again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::assets::{ASSET_SUFFIX, AssetIndex};
use crate::audit::Orchestrator;
use crate::config::RunOptions;

/// Watches blueprint files and triggers re-audits
pub struct AssetWatcher {
    index: Arc<AssetIndex>,
    orchestrator: Orchestrator,
    rx: mpsc::Receiver<PathBuf>,
    /// The underlying watcher (kept alive)
    _watcher: RecommendedWatcher,
}

impl AssetWatcher {
    /// Create a watcher over the project directory
    pub fn new(
        project_dir: impl AsRef<Path>,
        index: Arc<AssetIndex>,
        orchestrator: Orchestrator,
    ) -> Result<Self, notify::Error> {
        let project_dir = project_dir.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if let Some(path) = Self::event_to_asset_file(&event) {
                        let _ = tx.blocking_send(path);
                    }
                }
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            }
        })?;

        watcher.watch(&project_dir, RecursiveMode::Recursive)?;
        info!("Watching project directory: {}", project_dir.display());

        Ok(Self {
            index,
            orchestrator,
            rx,
            _watcher: watcher,
        })
    }

    /// Extract the changed blueprint file from a notify event
    fn event_to_asset_file(event: &Event) -> Option<PathBuf> {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {}
            _ => return None,
        }
        let path = event.paths.first()?;
        let name = path.file_name()?.to_str()?;
        if !name.ends_with(ASSET_SUFFIX) {
            return None;
        }
        Some(path.clone())
    }

    /// Process change events until the watcher is dropped
    pub async fn run(mut self) {
        while let Some(path) = self.rx.recv().await {
            let Some(asset_path) = self.index.refresh(&path) else {
                continue;
            };
            if !self.index.contains(&asset_path) {
                debug!("Asset removed: {}", asset_path);
                continue;
            }

            match self
                .orchestrator
                .start_run(vec![asset_path.clone()], RunOptions::default())
            {
                Ok(run_id) => {
                    info!("Asset changed, re-auditing {} (run {})", asset_path, run_id);
                }
                Err(e) => {
                    warn!("Could not queue re-audit for {}: {}", asset_path, e);
                }
            }
        }
    }
}
