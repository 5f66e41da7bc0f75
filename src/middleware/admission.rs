//! Per-caller admission control guarding the scan entry point.
//!
//! The gate is an injected collaborator rather than a process-wide
//! singleton, so the in-memory implementation can be swapped for one backed
//! by a shared store without touching the scan core.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::Mutex;

/// Outcome of one check-and-consume call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Granted,
    Denied { retry_after: Duration },
}

/// Request-budget check consulted once per inbound scan, before any fetch.
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    async fn check(&self, caller_id: &str) -> Admission;
}

/// Identity the budget is keyed by: the first `x-forwarded-for` entry,
/// falling back to loopback when the header is absent.
pub fn caller_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

struct WindowState {
    started: Instant,
    used: u32,
}

/// Fixed-window in-memory gate: `points` scans per caller per `window`.
pub struct MemoryAdmissionGate {
    points: u32,
    window: Duration,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl MemoryAdmissionGate {
    pub fn new(points: u32, window: Duration) -> Self {
        Self {
            points,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    async fn tracked_callers(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl AdmissionGate for MemoryAdmissionGate {
    async fn check(&self, caller_id: &str) -> Admission {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Caller ids come from a spoofable header; expired windows are
        // dropped on every check so the map cannot grow unboundedly.
        windows.retain(|_, state| now.duration_since(state.started) < self.window);

        let state = windows
            .entry(caller_id.to_string())
            .or_insert_with(|| WindowState {
                started: now,
                used: 0,
            });

        let elapsed = now.duration_since(state.started);
        if state.used < self.points {
            state.used += 1;
            Admission::Granted
        } else {
            Admission::Denied {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }
}
