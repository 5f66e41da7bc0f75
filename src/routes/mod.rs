//! Route definitions for the Supascan API.

pub mod health;
pub mod scan;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the application router.
///
/// Cross-origin access is restricted to the configured frontend origin;
/// when none is configured (or it is not a valid header value) any origin
/// is accepted.
pub fn router(state: AppState) -> Router {
    let allow_origin = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) if !state.config.frontend_url.is_empty() => AllowOrigin::exact(origin),
        _ => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/api/v1/scan", post(scan::scan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
