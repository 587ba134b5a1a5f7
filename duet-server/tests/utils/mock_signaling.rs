use duet_core::{ConnectionId, SignalMessage};
use duet_server::SignalingOutput;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Captures everything the registry delivers.
#[derive(Clone, Default)]
pub struct MockSignalingOutput {
    delivered: Arc<Mutex<Vec<(ConnectionId, SignalMessage)>>>,
    disconnected: Arc<Mutex<HashSet<ConnectionId>>>,
}

impl MockSignalingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsequent deliveries to `connection_id` report failure.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        self.disconnected.lock().unwrap().insert(connection_id);
    }

    pub fn messages_for(&self, connection_id: &ConnectionId) -> Vec<SignalMessage> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == connection_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn events_for(&self, connection_id: &ConnectionId) -> Vec<&'static str> {
        self.messages_for(connection_id)
            .iter()
            .map(|msg| msg.event_name())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn deliver(&self, connection_id: &ConnectionId, message: SignalMessage) -> bool {
        if self.disconnected.lock().unwrap().contains(connection_id) {
            return false;
        }
        self.delivered
            .lock()
            .unwrap()
            .push((*connection_id, message));
        true
    }
}
