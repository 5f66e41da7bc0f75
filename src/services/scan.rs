//! Scan orchestration.
//!
//! Runs one request through collection → extraction → schema resolution →
//! probing and aggregates the report. Admission is checked by the route
//! before this module does any work. Only root-page and schema-endpoint
//! failures abort a scan; every other failure is absorbed into the report.

use std::time::Duration;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::scan::{Credentials, ScanReport, ScanRequest};
use crate::scanner::fetcher::{FetchError, HttpFetch};
use crate::scanner::schema::SchemaError;
use crate::scanner::{assets, extract, probe, schema};

/// Execute one scan and produce its report.
pub async fn run(
    fetcher: &dyn HttpFetch,
    config: &AppConfig,
    request: &ScanRequest,
) -> Result<ScanReport, AppError> {
    tracing::info!(target = %request.target_url, "Starting scan");

    let corpus = assets::collect_corpus(fetcher, &request.target_url)
        .await
        .map_err(fatal_fetch_error)?;
    tracing::debug!(corpus_bytes = corpus.len(), "Collected script corpus");

    let extraction = extract::extract(&corpus);
    let token = request
        .override_token
        .clone()
        .or_else(|| extraction.token.clone());

    let credentials = match (extraction.base_url.clone(), token) {
        (Some(base_url), Some(token)) => Credentials { base_url, token },
        _ => {
            tracing::info!(
                client_paths = extraction.client_declared_paths.len(),
                "No backend credentials found"
            );
            return Ok(ScanReport::not_exposed(extraction.client_declared_paths));
        }
    };
    tracing::info!(base_url = %credentials.base_url, "Backend credentials discovered");

    let resources = schema::resolve(fetcher, &credentials)
        .await
        .map_err(fatal_schema_error)?;
    tracing::info!(resources = resources.len(), "Resolved backend schema");

    let findings = probe::probe_all(
        fetcher,
        &credentials,
        &resources,
        Duration::from_millis(config.auth_retry_backoff_ms),
    )
    .await;

    Ok(ScanReport::exposed(
        credentials,
        findings,
        extraction.client_declared_paths,
    ))
}

fn fatal_fetch_error(err: FetchError) -> AppError {
    match err {
        FetchError::Timeout { timeout, .. } => AppError::UpstreamTimeout(timeout),
        FetchError::Network { reason, .. } => AppError::UpstreamUnreachable(reason),
    }
}

fn fatal_schema_error(err: SchemaError) -> AppError {
    match err {
        SchemaError::Fetch(e) => fatal_fetch_error(e),
        other => AppError::UpstreamUnreachable(other.to_string()),
    }
}
