//! Backend schema discovery via the REST root introspection document.

use serde_json::Value;

use crate::models::scan::Credentials;
use crate::scanner::fetcher::{FetchError, HttpFetch};

/// One backend-exposed resource with the verbs its schema declares.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub path: String,
    pub has_get: bool,
    pub has_post: bool,
}

/// Failure to obtain or understand the schema document. Fatal to the scan:
/// without the schema there is nothing to probe.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("schema endpoint returned status {0}")]
    BadStatus(u16),

    #[error("malformed schema document: {0}")]
    Malformed(String),
}

/// REST root for a discovered backend.
pub fn rest_root(base_url: &str) -> String {
    format!("{base_url}/rest/v1")
}

/// The discovered token is attached as both the API-key header and a bearer
/// credential, matching how the backend's own client libraries authenticate.
pub fn auth_headers(token: &str) -> Vec<(String, String)> {
    vec![
        ("apikey".to_string(), token.to_string()),
        ("Authorization".to_string(), format!("Bearer {token}")),
    ]
}

/// Fetch and parse the schema, returning the probe candidate set.
pub async fn resolve(
    fetcher: &dyn HttpFetch,
    credentials: &Credentials,
) -> Result<Vec<ResourceDescriptor>, SchemaError> {
    let url = format!("{}/", rest_root(&credentials.base_url));
    let response = fetcher.get(&url, &auth_headers(&credentials.token)).await?;
    if !response.is_success() {
        return Err(SchemaError::BadStatus(response.status));
    }
    parse_schema(&response.body)
}

/// Enumerate resource paths from the schema document.
///
/// The root path and any path tagged `(rpc)` are excluded: remote procedures
/// have arbitrary side effects and are never probed.
pub fn parse_schema(body: &str) -> Result<Vec<ResourceDescriptor>, SchemaError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::Malformed("missing paths object".to_string()))?;

    let mut resources = Vec::new();
    for (path, declaration) in paths {
        if path == "/" || is_rpc(declaration) {
            continue;
        }
        resources.push(ResourceDescriptor {
            path: path.clone(),
            has_get: declaration.get("get").is_some(),
            has_post: declaration.get("post").is_some(),
        });
    }
    Ok(resources)
}

fn is_rpc(declaration: &Value) -> bool {
    let Some(verbs) = declaration.as_object() else {
        return false;
    };
    verbs.values().any(|verb| {
        verb.get("tags")
            .and_then(Value::as_array)
            .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some("(rpc)")))
    })
}
