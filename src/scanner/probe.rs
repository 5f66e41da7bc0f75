//! Per-resource permission probing.
//!
//! Reads sample the resource directly. Writes post an empty payload under a
//! server-side rollback instruction so a probe can never durably mutate
//! data. Paths are probed independently: one path failing never aborts the
//! others.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::models::scan::{Credentials, ResourceFinding, SampleData, Verdict};
use crate::scanner::fetcher::HttpFetch;
use crate::scanner::schema::{auth_headers, rest_root, ResourceDescriptor};

/// Status returned when the token has expired or failed verification, as
/// opposed to a row-level authorization rejection.
const AUTH_EXPIRED_STATUS: u16 = 401;

/// Extra read attempts after an auth-expired response. Guards against
/// transient token-refresh races on the backend side, not against genuine
/// authorization failure.
const AUTH_EXPIRED_RETRIES: u32 = 2;

/// Statuses meaning the payload was rejected by validation rather than by
/// the access-control layer. Authorization runs before validation in the
/// backend's request pipeline, so reaching validation proves the write
/// would have been authorized.
const VALIDATION_REJECTED: [u16; 2] = [400, 422];

/// Probe every candidate resource, concurrently, and collect findings.
pub async fn probe_all(
    fetcher: &dyn HttpFetch,
    credentials: &Credentials,
    resources: &[ResourceDescriptor],
    auth_retry_backoff: Duration,
) -> BTreeMap<String, ResourceFinding> {
    let probes = resources.iter().map(|resource| async move {
        let finding = probe_resource(fetcher, credentials, resource, auth_retry_backoff).await;
        (resource.path.clone(), finding)
    });
    join_all(probes).await.into_iter().collect()
}

async fn probe_resource(
    fetcher: &dyn HttpFetch,
    credentials: &Credentials,
    resource: &ResourceDescriptor,
    auth_retry_backoff: Duration,
) -> ResourceFinding {
    if !resource.has_get && !resource.has_post {
        return ResourceFinding {
            read: Verdict::NotTestable,
            write: Verdict::NotTestable,
            data: SampleData::Error {
                error: "Schema declares no operations for this path.".to_string(),
            },
        };
    }

    let url = format!("{}{}", rest_root(&credentials.base_url), resource.path);

    let (read, data) = probe_read(fetcher, &url, &credentials.token, auth_retry_backoff).await;
    let write = if resource.has_post {
        probe_write(fetcher, &url, &credentials.token).await
    } else {
        Verdict::NotTestable
    };

    ResourceFinding { read, write, data }
}

/// GET the resource, retrying only on an auth-expired response.
async fn probe_read(
    fetcher: &dyn HttpFetch,
    url: &str,
    token: &str,
    backoff: Duration,
) -> (Verdict, SampleData) {
    let headers = auth_headers(token);
    let mut attempt = 0;
    loop {
        match fetcher.get(url, &headers).await {
            Ok(response) if response.is_success() => {
                return (Verdict::Allowed, parse_sample(&response.body));
            }
            Ok(response)
                if response.status == AUTH_EXPIRED_STATUS && attempt < AUTH_EXPIRED_RETRIES =>
            {
                attempt += 1;
                tracing::debug!(url, attempt, "Auth-expired response, retrying read probe");
                sleep(backoff).await;
            }
            Ok(response) => {
                return (Verdict::Forbidden, SampleData::denied(Some(response.status)));
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Read probe failed without a status");
                return (Verdict::Forbidden, SampleData::denied(None));
            }
        }
    }
}

/// POST an empty payload under `Prefer: tx=rollback` and classify whether
/// the access-control layer let the request through.
async fn probe_write(fetcher: &dyn HttpFetch, url: &str, token: &str) -> Verdict {
    let mut headers = auth_headers(token);
    headers.push(("Prefer".to_string(), "tx=rollback".to_string()));

    match fetcher.post(url, &headers, json!({})).await {
        Ok(response) if response.is_success() => Verdict::Allowed,
        Ok(response) if VALIDATION_REJECTED.contains(&response.status) => Verdict::Allowed,
        Ok(response) => {
            tracing::debug!(url, status = response.status, "Write probe rejected");
            Verdict::Forbidden
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "Write probe failed without a status");
            Verdict::Forbidden
        }
    }
}

fn parse_sample(body: &str) -> SampleData {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(records)) => SampleData::Records(records),
        Ok(other) => SampleData::Records(vec![other]),
        // A 2xx body that is not JSON is still worth reporting.
        Err(_) => SampleData::Records(vec![Value::String(body.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::testing::StubFetcher;

    fn credentials() -> Credentials {
        Credentials {
            base_url: "https://abcd1234.supabase.co".to_string(),
            token: "eyJabc.def.ghi".to_string(),
        }
    }

    fn resource(path: &str, has_get: bool, has_post: bool) -> ResourceDescriptor {
        ResourceDescriptor {
            path: path.to_string(),
            has_get,
            has_post,
        }
    }

    const USERS_URL: &str = "https://abcd1234.supabase.co/rest/v1/users";

    #[tokio::test]
    async fn readable_resource_yields_sample_records() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 200, r#"[{"id": 1}, {"id": 2}]"#);

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        let finding = &findings["/users"];
        assert_eq!(finding.read, Verdict::Allowed);
        assert_eq!(finding.write, Verdict::NotTestable);
        assert!(matches!(&finding.data, SampleData::Records(r) if r.len() == 2));
    }

    #[tokio::test]
    async fn no_declared_write_sends_no_post() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 200, "[]");

        probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(stub.call_count("POST", USERS_URL), 0);
    }

    #[tokio::test]
    async fn auth_expired_read_is_retried_twice_then_forbidden() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 401, "JWT expired");
        stub.on_get(USERS_URL, 401, "JWT expired");
        stub.on_get(USERS_URL, 401, "JWT expired");

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(stub.call_count("GET", USERS_URL), 3);
        assert_eq!(findings["/users"].read, Verdict::Forbidden);
        assert_eq!(
            findings["/users"].data,
            SampleData::denied(Some(401))
        );
    }

    #[tokio::test]
    async fn auth_expired_then_success_is_allowed() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 401, "JWT expired");
        stub.on_get(USERS_URL, 200, r#"[{"id": 1}]"#);

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(stub.call_count("GET", USERS_URL), 2);
        assert_eq!(findings["/users"].read, Verdict::Allowed);
    }

    #[tokio::test]
    async fn forbidden_read_is_not_retried() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 403, "permission denied");

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(stub.call_count("GET", USERS_URL), 1);
        assert_eq!(findings["/users"].read, Verdict::Forbidden);
    }

    #[tokio::test]
    async fn validation_rejected_write_counts_as_allowed() {
        for status in [400, 422] {
            let stub = StubFetcher::new();
            stub.on_get(USERS_URL, 403, "permission denied");
            stub.on_post(USERS_URL, status, "null value violates not-null constraint");

            let findings = probe_all(
                &stub,
                &credentials(),
                &[resource("/users", true, true)],
                Duration::ZERO,
            )
            .await;

            assert_eq!(findings["/users"].write, Verdict::Allowed, "status {status}");
        }
    }

    #[tokio::test]
    async fn authorization_rejected_write_is_forbidden() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 200, "[]");
        stub.on_post(USERS_URL, 403, "permission denied");

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, true)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(findings["/users"].write, Verdict::Forbidden);
    }

    #[tokio::test]
    async fn successful_write_is_allowed() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 200, "[]");
        stub.on_post(USERS_URL, 201, "");

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, true)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(findings["/users"].write, Verdict::Allowed);
        assert_eq!(stub.call_count("POST", USERS_URL), 1);
    }

    #[tokio::test]
    async fn one_failing_path_does_not_stop_the_others() {
        let stub = StubFetcher::new();
        stub.on_get_network_error("https://abcd1234.supabase.co/rest/v1/broken");
        stub.on_get(USERS_URL, 200, r#"[{"id": 1}]"#);

        let findings = probe_all(
            &stub,
            &credentials(),
            &[
                resource("/broken", true, false),
                resource("/users", true, false),
            ],
            Duration::ZERO,
        )
        .await;

        assert_eq!(findings.len(), 2);
        assert_eq!(findings["/users"].read, Verdict::Allowed);
        assert_eq!(findings["/broken"].read, Verdict::Forbidden);
        assert_eq!(findings["/broken"].data, SampleData::denied(None));
    }

    #[tokio::test]
    async fn no_declared_verbs_sends_no_requests() {
        let stub = StubFetcher::new();

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/opaque", false, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(stub.total_calls(), 0);
        assert_eq!(findings["/opaque"].read, Verdict::NotTestable);
        assert_eq!(findings["/opaque"].write, Verdict::NotTestable);
    }

    #[tokio::test]
    async fn non_json_read_body_is_kept_as_raw_record() {
        let stub = StubFetcher::new();
        stub.on_get(USERS_URL, 200, "plain text");

        let findings = probe_all(
            &stub,
            &credentials(),
            &[resource("/users", true, false)],
            Duration::ZERO,
        )
        .await;

        assert_eq!(
            findings["/users"].data,
            SampleData::Records(vec![serde_json::Value::String("plain text".to_string())])
        );
    }
}
