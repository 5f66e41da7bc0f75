//! Unified error handling with consistent API response envelope.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }

    /// Wrap an error in the envelope.
    pub fn error(code: &str, message: &str) -> Json<Self> {
        Json(Self {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Too many requests: retry in {0:?}")]
    AdmissionDenied(Duration),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Check if this error represents an admission rejection.
    pub fn is_admission_denied(&self) -> bool {
        matches!(self, Self::AdmissionDenied(_))
    }

    /// Check if this error represents an upstream timeout.
    pub fn is_upstream_timeout(&self) -> bool {
        matches!(self, Self::UpstreamTimeout(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::AdmissionDenied(retry_after) => (
                StatusCode::TOO_MANY_REQUESTS,
                "TOO_MANY_REQUESTS",
                format!(
                    "Too many scan requests. Please wait {} seconds before trying again.",
                    retry_after.as_secs().max(1)
                ),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::UpstreamTimeout(timeout) => (
                StatusCode::REQUEST_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                format!(
                    "Could not reach the site. The request timed out after {} seconds.",
                    timeout.as_secs()
                ),
            ),
            AppError::UpstreamUnreachable(reason) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNREACHABLE",
                format!("Could not reach the site: {reason}"),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred during the scan.".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        };

        (status, Json(body)).into_response()
    }
}
