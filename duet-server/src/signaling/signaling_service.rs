use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use duet_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Outbound queue per attached connection.
#[derive(Clone, Default)]
pub struct SignalingService {
    peers: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<SignalMessage>>>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, connection_id: ConnectionId) -> mpsc::UnboundedReceiver<SignalMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(connection_id, tx);
        rx
    }

    pub fn detach(&self, connection_id: &ConnectionId) {
        self.peers.remove(connection_id);
    }

    pub fn is_attached(&self, connection_id: &ConnectionId) -> bool {
        self.peers.contains_key(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }
}

impl SignalingOutput for SignalingService {
    fn deliver(&self, connection_id: &ConnectionId, message: SignalMessage) -> bool {
        let Some(peer) = self.peers.get(connection_id) else {
            warn!(
                "Attempted to send {} to disconnected connection {}",
                message.event_name(),
                connection_id
            );
            return false;
        };

        if let Err(e) = peer.send(message) {
            error!(
                "Failed to queue {} for {}: connection closed",
                e.0.event_name(),
                connection_id
            );
            return false;
        }
        true
    }
}
