use duet_core::{ConnectionId, SignalMessage};

/// Sink the room registry uses to push events to connected clients.
///
/// Called while a room entry is locked, so implementations must only enqueue.
pub trait SignalingOutput: Send + Sync {
    /// Returns `false` when the connection is no longer attached.
    fn deliver(&self, connection_id: &ConnectionId, message: SignalMessage) -> bool;
}
