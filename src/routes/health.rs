//! Health check endpoints for liveness and readiness probes.

use axum::Json;
use serde::Serialize;

use crate::errors::ApiResponse;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Liveness probe — always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe — the service holds no external connections, so readiness
/// reduces to the process being up.
pub async fn ready() -> Json<ApiResponse<HealthStatus>> {
    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
