//! Bridge Protocol
//!
//! Request and response bodies of the HTTP endpoints. Everything is
//! camelCase on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RunOptions;

/// Body of `POST /audit/runs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartRunRequest {
    /// Asset paths to audit; empty means every indexed asset
    pub scope: Vec<String>,
    /// Per-run configuration overrides
    pub config: RunOptions,
}

/// Response of `POST /audit/runs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
    pub run_id: Uuid,
}

/// Response of `GET /assets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetListResponse {
    pub assets: Vec<String>,
}

/// Query string of the asset reference endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetRefQuery {
    pub asset: Option<String>,
}

/// Response of `GET /asset-refs/dependencies`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependenciesResponse {
    pub asset: String,
    pub dependencies: Vec<String>,
}

/// Response of `GET /asset-refs/referencers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencersResponse {
    pub asset: String,
    pub referencers: Vec<String>,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub port: u16,
    pub pid: u32,
    pub assets: usize,
}
