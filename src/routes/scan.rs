//! Scan route: admission check, request validation, then the scan pipeline.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::admission::{self, Admission};
use crate::models::scan::{ScanRequest, ScanReport};
use crate::services::scan as scan_service;
use crate::AppState;

/// POST /api/v1/scan — scan a target site for exposed backend credentials
/// and probe what they grant.
///
/// The admission gate is consulted before anything else; a denied caller
/// consumes no resources. Validation runs next, before any network access.
pub async fn scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<ScanReport>>, AppError> {
    let caller = admission::caller_id(&headers);
    if let Admission::Denied { retry_after } = state.admission.check(&caller).await {
        tracing::info!(caller, "Scan request rejected by admission gate");
        return Err(AppError::AdmissionDenied(retry_after));
    }

    let request = ScanRequest::from_value(&body)?;
    let report = scan_service::run(state.fetcher.as_ref(), &state.config, &request).await?;
    Ok(ApiResponse::success(report))
}
