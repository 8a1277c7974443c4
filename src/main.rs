use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::info;

mod config;
mod error;
mod handlers;
mod llm;
mod prompt;
mod router;
mod state;
mod uploads;
mod utils;

use config::Config;
use router::build_router;
use state::AppState;
use utils::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    // Logging comes up before the config so that load-time warnings about
    // unknown settings are not lost.
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let _guards = init_logging(&log_level);
    let config = Config::load()?;

    info!("Starting AgenticMarketers backend");

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.generated_dir).await?;

    let port = config.port;
    let state = AppState::new(config).await;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Backend available at http://{addr}");
    info!("Health check: http://{addr}/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
