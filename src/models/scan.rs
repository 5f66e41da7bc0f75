//! Scan request and report wire types.
//!
//! The report shape is consumed verbatim by the frontend, so optional
//! sections are omitted rather than serialized as null.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::errors::AppError;

/// Validated inbound scan request.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub target_url: Url,
    pub override_token: Option<String>,
}

impl ScanRequest {
    /// Validate a raw JSON body field-by-field.
    ///
    /// Validation failures never trigger outbound network access, so the
    /// checks run before anything else in the scan pipeline.
    pub fn from_value(body: &Value) -> Result<Self, AppError> {
        let target = match body.get("targetUrl") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(AppError::Validation(
                    "targetUrl must be a string.".to_string(),
                ))
            }
            None => return Err(AppError::Validation("A valid URL is required.".to_string())),
        };

        let target_url = Url::parse(target).map_err(|_| {
            AppError::Validation("targetUrl must be an absolute URL.".to_string())
        })?;
        if !matches!(target_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(
                "targetUrl must use the http or https scheme.".to_string(),
            ));
        }

        let override_token = match body.get("overrideToken") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(AppError::Validation(
                    "overrideToken must be a string.".to_string(),
                ))
            }
        };

        Ok(Self {
            target_url,
            override_token,
        })
    }
}

/// Backend credentials discovered in client-side code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub base_url: String,
    pub token: String,
}

/// Outcome of probing one HTTP verb against one resource path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Forbidden,
    NotTestable,
}

/// Sampled records from a readable resource, or the error note observed
/// while trying to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleData {
    Records(Vec<Value>),
    Error { error: String },
}

impl SampleData {
    pub fn denied(status: Option<u16>) -> Self {
        let status = status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        Self::Error {
            error: format!("Access denied or failed to fetch. Status: {status}"),
        }
    }
}

/// Per-resource probe results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFinding {
    pub read: Verdict,
    pub write: Verdict,
    pub data: SampleData,
}

/// Terminal artifact of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub exposed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<BTreeMap<String, ResourceFinding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_declared_paths: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ScanReport {
    /// Report for a scan that found no backend credentials.
    ///
    /// Any client-declared paths are still surfaced: their presence suggests
    /// a backend exists even though its identifiers were not embedded in the
    /// scanned scripts.
    pub fn not_exposed(client_declared_paths: BTreeSet<String>) -> Self {
        let diagnostic = if client_declared_paths.is_empty() {
            "Scan complete. No public backend credentials or resource paths were found."
                .to_string()
        } else {
            format!(
                "Scan complete. No public backend credentials were found, but {} \
                 client-declared resource path(s) were present; the backend identifiers \
                 may not be embedded in the scanned scripts.",
                client_declared_paths.len()
            )
        };

        Self {
            exposed: false,
            base_url: None,
            token: None,
            findings: None,
            client_declared_paths: if client_declared_paths.is_empty() {
                None
            } else {
                Some(client_declared_paths)
            },
            diagnostic: Some(diagnostic),
        }
    }

    /// Report for a scan that found credentials and probed the backend.
    pub fn exposed(
        credentials: Credentials,
        findings: BTreeMap<String, ResourceFinding>,
        client_declared_paths: BTreeSet<String>,
    ) -> Self {
        Self {
            exposed: true,
            base_url: Some(credentials.base_url),
            token: Some(credentials.token),
            findings: Some(findings),
            client_declared_paths: if client_declared_paths.is_empty() {
                None
            } else {
                Some(client_declared_paths)
            },
            diagnostic: None,
        }
    }
}
