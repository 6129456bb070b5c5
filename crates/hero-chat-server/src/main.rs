use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

use hero_chat_server::config::Settings;
use hero_chat_server::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    let _log_guard = telemetry::init_tracing(&settings.logging);

    info!("🚀 Starting Hero Chat Server...");
    info!("✅ Configuration loaded");

    if settings.gemini.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set, chat replies will report generation errors");
    }

    let state = AppState::from_settings(&settings);

    // Background sweep of idle sessions
    if settings.conversation.idle_ttl().is_some() {
        let engine = state.engine.clone();
        let every = Duration::from_secs(settings.conversation.sweep_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                engine.sweep_idle();
            }
        });
        info!("✅ Idle session sweeper started (every {:?})", every);
    }

    let app = build_router(state);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
