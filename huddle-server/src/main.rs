use anyhow::{Context, Result};
use clap::Parser;
use huddle_server::{RelayConfig, SignalingService, router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RelayConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log)),
        )
        .init();

    let service = SignalingService::default();
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Signaling relay listening on ws://{}/ws/{{room_id}}", config.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
