//! Outbound HTTP with a fixed per-request timeout. The sole point of
//! network I/O in the scanner; retry policy belongs to callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::AppConfig;

/// A completed HTTP exchange. Non-2xx statuses are returned as values, not
/// errors, so probes can classify them.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete an exchange at all. Timeouts are kept distinct so the
/// orchestrator can surface a retry-later message instead of a generic one.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
}

/// Trait seam over the HTTP client so probes and the orchestrator can be
/// exercised against stub transports.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, FetchError>;

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Value,
    ) -> Result<FetchResponse, FetchError>;
}

/// Production fetcher backed by a pooled reqwest client.
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = config.fetch_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    async fn read_body(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<FetchResponse, FetchError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify(url, e))?;
        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await.map_err(|e| self.classify(url, e))?;
        self.read_body(url, response).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Value,
    ) -> Result<FetchResponse, FetchError> {
        let mut request = self.client.post(url).json(&body);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await.map_err(|e| self.classify(url, e))?;
        self.read_body(url, response).await
    }
}
