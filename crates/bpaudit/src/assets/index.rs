// Asset Index
//
// Maps asset paths (/Game/...) to blueprint files under the project
// directory and provides copy-on-read snapshots for the audit pass. The
// per-asset lock is held only for the duration of a single file read, so
// audits never block the host for long.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use audit_graph::{AdapterError, Graph, HostBlueprint, adapt, asset_references};

/// File suffix identifying blueprint assets
pub const ASSET_SUFFIX: &str = ".bp.json";
/// Root prefix for project content, matching the host's package paths
pub const ASSET_ROOT: &str = "/Game";

/// Errors scanning the project directory
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("project path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("failed to scan project directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A consistent, owned snapshot of one asset
pub struct AssetSnapshot {
    pub asset_path: String,
    /// Asset name from the blueprint file
    pub name: String,
    /// Hash of the source file contents at read time
    pub source_hash: String,
    /// Normalized graphs, in file order
    pub graphs: Vec<Graph>,
}

struct AssetEntry {
    file: PathBuf,
    /// Guards the single read against concurrent refreshes of this asset
    lock: Arc<RwLock<()>>,
}

/// Read-only index of blueprint assets
pub struct AssetIndex {
    project_dir: PathBuf,
    entries: DashMap<String, AssetEntry>,
}

impl AssetIndex {
    /// Scan the project directory for `*.bp.json` assets
    pub fn scan(project_dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        let project_dir = project_dir.as_ref();
        if !project_dir.exists() {
            return Err(IndexError::PathNotFound(project_dir.to_path_buf()));
        }
        let project_dir = project_dir
            .canonicalize()
            .unwrap_or_else(|_| project_dir.to_path_buf());

        let index = Self {
            project_dir: project_dir.clone(),
            entries: DashMap::new(),
        };
        index.scan_dir(&project_dir)?;
        info!(
            "Indexed {} blueprint asset(s) under {}",
            index.entries.len(),
            project_dir.display()
        );
        Ok(index)
    }

    fn scan_dir(&self, dir: &Path) -> Result<(), IndexError> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.scan_dir(&path)?;
            } else if let Some(asset_path) = self.asset_path_for(&path) {
                debug!("Indexed asset: {}", asset_path);
                self.entries.insert(
                    asset_path,
                    AssetEntry {
                        file: path,
                        lock: Arc::new(RwLock::new(())),
                    },
                );
            }
        }
        Ok(())
    }

    /// Derive the asset path for a file, or None if it is not an asset
    pub fn asset_path_for(&self, file: &Path) -> Option<String> {
        let name = file.file_name()?.to_str()?;
        if !name.ends_with(ASSET_SUFFIX) {
            return None;
        }
        let rel = file.strip_prefix(&self.project_dir).ok()?;
        let mut path = String::from(ASSET_ROOT);
        for component in rel.components() {
            path.push('/');
            path.push_str(component.as_os_str().to_str()?);
        }
        Some(path.trim_end_matches(ASSET_SUFFIX).to_string())
    }

    /// All known asset paths, sorted
    pub fn list(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn contains(&self, asset_path: &str) -> bool {
        self.entries.contains_key(asset_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-check a single file after a change notification
    ///
    /// Returns the affected asset path, if the file is an asset.
    pub fn refresh(&self, file: &Path) -> Option<String> {
        let asset_path = self.asset_path_for(file)?;
        if file.exists() {
            match self.entries.entry(asset_path.clone()) {
                Entry::Occupied(occupied) => {
                    // Take the write side so an in-flight read finishes first
                    let _guard = occupied.get().lock.write();
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(AssetEntry {
                        file: file.to_path_buf(),
                        lock: Arc::new(RwLock::new(())),
                    });
                }
            }
        } else {
            self.entries.remove(&asset_path);
        }
        Some(asset_path)
    }

    /// Take a copy-on-read snapshot of one asset
    ///
    /// Acquires the asset's read lock for the duration of a single file
    /// read, then adapts the content into normalized graphs. A missing file
    /// maps to `Detached`, unparseable content to `Unsupported`.
    pub fn read_snapshot(&self, asset_path: &str) -> Result<AssetSnapshot, AdapterError> {
        let (bytes, source_hash) = self.read_bytes(asset_path)?;

        let blueprint: HostBlueprint = serde_json::from_slice(&bytes)
            .map_err(|e| AdapterError::Unsupported(format!("malformed asset JSON: {}", e)))?;

        let graphs = adapt(asset_path, &blueprint);
        Ok(AssetSnapshot {
            asset_path: asset_path.to_string(),
            name: blueprint.name,
            source_hash,
            graphs,
        })
    }

    /// Hash the asset's source file without adapting it (stale detection)
    pub fn source_hash(&self, asset_path: &str) -> Result<String, AdapterError> {
        let (_, hash) = self.read_bytes(asset_path)?;
        Ok(hash)
    }

    /// Assets this asset references, sorted
    ///
    /// References come from the parent class, node `asset_ref` fields and
    /// string pin defaults pointing at `/Game/...` content.
    pub fn dependencies(&self, asset_path: &str) -> Result<Vec<String>, AdapterError> {
        let (bytes, _) = self.read_bytes(asset_path)?;
        let blueprint: HostBlueprint = serde_json::from_slice(&bytes)
            .map_err(|e| AdapterError::Unsupported(format!("malformed asset JSON: {}", e)))?;
        Ok(asset_references(&blueprint).into_iter().collect())
    }

    /// Indexed assets whose dependency set contains this asset, sorted
    ///
    /// The reverse query re-reads every indexed asset on demand; assets that
    /// fail to read are skipped.
    pub fn referencers(&self, asset_path: &str) -> Result<Vec<String>, AdapterError> {
        if !self.contains(asset_path) {
            return Err(AdapterError::Detached(asset_path.to_string()));
        }

        let mut referencers = Vec::new();
        for other in self.list() {
            if other == asset_path {
                continue;
            }
            match self.dependencies(&other) {
                Ok(deps) if deps.iter().any(|d| d == asset_path) => referencers.push(other),
                Ok(_) => {}
                Err(e) => {
                    debug!("Skipping {} in referencer scan: {}", other, e);
                }
            }
        }
        Ok(referencers)
    }

    fn read_bytes(&self, asset_path: &str) -> Result<(Vec<u8>, String), AdapterError> {
        let entry = self
            .entries
            .get(asset_path)
            .ok_or_else(|| AdapterError::Detached(asset_path.to_string()))?;
        let lock = Arc::clone(&entry.lock);
        let file = entry.file.clone();
        drop(entry);

        let _guard = lock.read();
        let bytes = std::fs::read(&file)
            .map_err(|_| AdapterError::Detached(asset_path.to_string()))?;
        let hash = hex::encode(Sha256::digest(&bytes));
        Ok((bytes, hash))
    }
}
