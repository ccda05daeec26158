//! Lead Relay - Main Entry Point
//!
//! Serves the lead webhook and relays submissions to Telegram and email.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use lead_relay::{api, config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_relay=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env().context("Invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        policy = %config.success_policy,
        timezone = %config.timezone,
        "Starting Lead Relay"
    );

    if !config.has_telegram() {
        warn!("Telegram channel not configured; deliveries will be skipped");
    }
    if !config.has_smtp() {
        warn!("Email channel not configured; deliveries will be skipped");
    }

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    // Build application state
    let state = api::AppState::new(config.clone(), http_client);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
