//! Bridge Errors
//!
//! Every endpoint reports failures with the same JSON body:
//! `{ "error": { "kind": ..., "message": ... } }`, with the HTTP status
//! derived from the kind.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use audit_graph::AdapterError;

use crate::audit::OrchestratorError;

/// Error returned by bridge handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("an audit run is already active")]
    RunBusy,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::NotFound(_) => "NotFound",
            ApiError::RunBusy => "RunBusy",
            ApiError::Internal(_) => "Internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RunBusy => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::RunBusy => ApiError::RunBusy,
            OrchestratorError::NotFound(id) => ApiError::NotFound(format!("run not found: {}", id)),
            OrchestratorError::Shutdown => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AdapterError> for ApiError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::Detached(asset) => ApiError::NotFound(format!("unknown asset: {}", asset)),
            AdapterError::Unsupported(message) => ApiError::Internal(message),
        }
    }
}
