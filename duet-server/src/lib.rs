mod config;
mod relay;
mod room;
mod routes;
mod signaling;

pub use config::ServerConfig;
pub use relay::Relay;
pub use room::*;
pub use routes::*;
pub use signaling::*;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

/// Serves the relay on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, relay: Relay) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("Signaling relay listening on http://{}", addr);

    axum::serve(listener, router(relay))
        .await
        .context("relay server failed")
}
