//! Bridge Handlers
//!
//! One function per endpoint. Handlers translate between the wire protocol
//! and the orchestrator/store; scope validation happens here so the
//! orchestrator never sees unknown asset paths.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde_json::{Value, json};
use uuid::Uuid;

use audit_graph::Report;

use super::context::AuditContext;
use super::error::ApiError;
use super::protocol::{
    AssetListResponse, AssetRefQuery, DependenciesResponse, ReferencersResponse, StartRunRequest,
    StartRunResponse,
};
use crate::audit::RunStatus;

/// `POST /audit/runs`
///
/// The body is parsed by hand so malformed JSON maps to the structured
/// `BadRequest` body instead of axum's plain-text rejection.
pub async fn start_run(
    State(ctx): State<AuditContext>,
    body: Bytes,
) -> Result<Json<StartRunResponse>, ApiError> {
    let request: StartRunRequest = if body.is_empty() {
        StartRunRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?
    };

    for asset in &request.scope {
        if !ctx.index.contains(asset) {
            return Err(ApiError::NotFound(format!("unknown asset: {}", asset)));
        }
    }

    let run_id = ctx.orchestrator.start_run(request.scope, request.config)?;
    Ok(Json(StartRunResponse { run_id }))
}

/// `GET /audit/runs/:id`
pub async fn get_run(
    State(ctx): State<AuditContext>,
    Path(id): Path<String>,
) -> Result<Json<RunStatus>, ApiError> {
    let run_id = parse_run_id(&id)?;
    let status = ctx
        .orchestrator
        .run_status(run_id)
        .ok_or_else(|| ApiError::NotFound(format!("run not found: {}", run_id)))?;
    Ok(Json(status))
}

/// `DELETE /audit/runs/:id`
pub async fn cancel_run(
    State(ctx): State<AuditContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let run_id = parse_run_id(&id)?;
    ctx.orchestrator.cancel_run(run_id)?;
    Ok(Json(json!({})))
}

/// `GET /audit/runs/:id/reports`
pub async fn list_run_reports(
    State(ctx): State<AuditContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let run_id = parse_run_id(&id)?;
    let reports = ctx
        .store
        .list(run_id)
        .ok_or_else(|| ApiError::NotFound(format!("no reports for run: {}", run_id)))?;
    Ok(Json(reports.iter().map(|r| (**r).clone()).collect()))
}

/// `GET /audit/reports/*asset`
pub async fn get_report(
    State(ctx): State<AuditContext>,
    Path(asset): Path<String>,
) -> Result<Json<Report>, ApiError> {
    // The wildcard capture drops the leading slash of the asset path
    let asset_path = format!("/{}", asset.trim_start_matches('/'));
    let report = ctx
        .store
        .get(&asset_path)
        .ok_or_else(|| ApiError::NotFound(format!("no report for asset: {}", asset_path)))?;
    Ok(Json((*report).clone()))
}

/// `GET /assets`
pub async fn list_assets(State(ctx): State<AuditContext>) -> Json<AssetListResponse> {
    Json(AssetListResponse {
        assets: ctx.index.list(),
    })
}

/// `GET /asset-refs/dependencies?asset=...`
pub async fn asset_dependencies(
    State(ctx): State<AuditContext>,
    Query(query): Query<AssetRefQuery>,
) -> Result<Json<DependenciesResponse>, ApiError> {
    let asset = required_asset(query)?;
    ensure_known(&ctx, &asset)?;

    let index = Arc::clone(&ctx.index);
    let path = asset.clone();
    let dependencies = tokio::task::spawn_blocking(move || index.dependencies(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(DependenciesResponse {
        asset,
        dependencies,
    }))
}

/// `GET /asset-refs/referencers?asset=...`
///
/// Scans every indexed asset, so it runs on the blocking pool.
pub async fn asset_referencers(
    State(ctx): State<AuditContext>,
    Query(query): Query<AssetRefQuery>,
) -> Result<Json<ReferencersResponse>, ApiError> {
    let asset = required_asset(query)?;
    ensure_known(&ctx, &asset)?;

    let index = Arc::clone(&ctx.index);
    let path = asset.clone();
    let referencers = tokio::task::spawn_blocking(move || index.referencers(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(ReferencersResponse { asset, referencers }))
}

fn required_asset(query: AssetRefQuery) -> Result<String, ApiError> {
    query
        .asset
        .ok_or_else(|| ApiError::BadRequest("missing 'asset' query parameter".to_string()))
}

fn ensure_known(ctx: &AuditContext, asset: &str) -> Result<(), ApiError> {
    if !ctx.index.contains(asset) {
        return Err(ApiError::NotFound(format!("unknown asset: {}", asset)));
    }
    Ok(())
}

fn parse_run_id(id: &str) -> Result<Uuid, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid run id: {}", id)))
}
