pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scanner;
pub mod services;

use std::sync::Arc;

use crate::middleware::admission::AdmissionGate;
use crate::scanner::fetcher::HttpFetch;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub fetcher: Arc<dyn HttpFetch>,
    pub admission: Arc<dyn AdmissionGate>,
}
