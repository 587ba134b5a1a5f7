use crate::media::LocalMedia;
use crate::transport::TransportEvent;
use anyhow::Result;
use async_trait::async_trait;
use duet_core::{Candidate, SessionDescription};
use tokio::sync::mpsc;

/// The runtime's peer-connection capability, as the negotiator sees it.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: &SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: &SessionDescription) -> Result<()>;

    async fn add_candidate(&self, candidate: &Candidate) -> Result<()>;

    /// Tears down the connection and releases every callback registration.
    async fn close(&self) -> Result<()>;
}

/// Builds a fresh transport with the local tracks attached. Transports are
/// never reused: every call or glare rollback gets a new one.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        generation: u64,
        media: &LocalMedia,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
