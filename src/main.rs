use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use lookalike::config::Config;
use lookalike::gateway::GeminiGateway;
use lookalike::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    lookalike::logging::init("info");

    let config = Config::from_env()?;
    let state = AppState {
        gateway: Arc::new(GeminiGateway::new(&config)),
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        model = %config.model,
        "🚀 Server running, open it in your browser to find your lookalike"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
