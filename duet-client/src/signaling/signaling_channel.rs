use async_trait::async_trait;
use duet_core::{CallError, SignalMessage};

/// Bidirectional message pipe to the relay.
#[async_trait]
pub trait SignalingChannel: Send {
    async fn send(&mut self, message: SignalMessage) -> Result<(), CallError>;

    /// Next inbound message, or `None` once the channel is gone.
    /// Cancel safe: a dropped future loses no message.
    async fn recv(&mut self) -> Option<SignalMessage>;

    /// Idempotent.
    async fn close(&mut self);
}
