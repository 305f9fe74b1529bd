//! HTTP Router
//!
//! Sets up the axum router for the bridge endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::context::AuditContext;
use super::handlers;
use super::protocol::HealthResponse;

/// Create the application router
pub fn create_router(ctx: AuditContext) -> Router {
    Router::new()
        .route("/audit/runs", post(handlers::start_run))
        .route(
            "/audit/runs/:id",
            get(handlers::get_run).delete(handlers::cancel_run),
        )
        .route("/audit/runs/:id/reports", get(handlers::list_run_reports))
        .route("/audit/reports/*asset", get(handlers::get_report))
        .route("/assets", get(handlers::list_assets))
        .route(
            "/asset-refs/dependencies",
            get(handlers::asset_dependencies),
        )
        .route("/asset-refs/referencers", get(handlers::asset_referencers))
        // Health check for the editor-side client discovering the bridge
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        // CORS for development
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Health check endpoint
async fn health_check(State(ctx): State<AuditContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        port: ctx.port,
        pid: std::process::id(),
        assets: ctx.index.len(),
    })
}
