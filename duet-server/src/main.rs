use anyhow::Context;
use clap::Parser;
use duet_server::{Relay, ServerConfig, serve, spawn_idle_sweeper};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::parse();
    info!("Initializing signaling relay: {:?}", config);

    let relay = Relay::new();
    spawn_idle_sweeper(
        relay.registry().clone(),
        config.room_sweep_interval(),
        config.room_idle_timeout(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    serve(listener, relay).await
}
