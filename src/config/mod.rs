use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout applied to every outbound fetch.
    pub fetch_timeout_secs: u64,
    /// User agent sent with every outbound request.
    pub user_agent: String,
    /// Scans allowed per caller within one admission window.
    pub admission_points: u32,
    /// Length of the admission window in seconds.
    pub admission_window_secs: u64,
    /// Delay between retries of an auth-expired read probe, in milliseconds.
    pub auth_retry_backoff_ms: u64,
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("SUPASCAN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SUPASCAN_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            fetch_timeout_secs: env::var("SUPASCAN_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            user_agent: env::var("SUPASCAN_USER_AGENT")
                .unwrap_or_else(|_| format!("SupascanBot/{}", env!("CARGO_PKG_VERSION"))),
            admission_points: env::var("SUPASCAN_ADMISSION_POINTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            admission_window_secs: env::var("SUPASCAN_ADMISSION_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            auth_retry_backoff_ms: env::var("SUPASCAN_AUTH_RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
