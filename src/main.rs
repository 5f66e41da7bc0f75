use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use supascan::config::AppConfig;
use supascan::middleware::admission::MemoryAdmissionGate;
use supascan::scanner::fetcher::ReqwestFetcher;
use supascan::{routes, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supascan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let fetcher = Arc::new(ReqwestFetcher::new(&config)?);
    let admission = Arc::new(MemoryAdmissionGate::new(
        config.admission_points,
        Duration::from_secs(config.admission_window_secs),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(host = %addr, "Starting Supascan API server");

    let state = AppState {
        config,
        fetcher,
        admission,
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
