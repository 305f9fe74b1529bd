//! Audit Configuration
//!
//! Loaded from `audit.toml` in the project directory; every field has a
//! documented default so the file is optional. Rule thresholds can be
//! overridden per run through the bridge.

use std::path::Path;

use serde::{Deserialize, Serialize};

use audit_rules::RuleConfig;

/// Top-level configuration (`audit.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub server: ServerConfig,
    pub run: RunConfig,
    pub rules: RuleConfig,
}

/// HTTP bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// First port to try binding
    pub port: u16,
    /// Number of consecutive ports to try before giving up
    pub port_attempts: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 19900,
            port_attempts: 10,
        }
    }
}

/// Run execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Bounded worker pool size for per-asset audits within a run
    pub workers: usize,
    /// How many runs may wait behind the active one before `RunBusy`
    pub queue_depth: usize,
    /// How many runs' reports the store keeps (oldest evicted first)
    pub retain_runs: usize,
    /// Skip re-analysis of assets whose source hash is unchanged
    pub incremental: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: 4,
            retain_runs: 8,
            incremental: false,
        }
    }
}

/// Per-run overrides accepted in the `config` field of a start-run request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub incremental: Option<bool>,
    pub rules: Option<RuleConfig>,
}

/// Errors loading the configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl AuditConfig {
    /// Load `audit.toml` from the project directory, falling back to
    /// defaults when the file does not exist
    pub fn load(project_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = project_dir.as_ref().join("audit.toml");
        if !path.exists() {
            tracing::debug!("no audit.toml found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
