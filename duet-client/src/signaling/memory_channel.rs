use crate::signaling::SignalingChannel;
use async_trait::async_trait;
use duet_core::{CallError, SignalMessage};
use tokio::sync::mpsc;

/// In-process channel, for wiring a client straight into a relay or a test.
pub struct MemorySignalingChannel {
    outbound: Option<mpsc::UnboundedSender<SignalMessage>>,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

/// The far end of a [`MemorySignalingChannel`].
pub struct MemoryChannelPeer {
    pub to_client: mpsc::UnboundedSender<SignalMessage>,
    pub from_client: mpsc::UnboundedReceiver<SignalMessage>,
}

impl MemorySignalingChannel {
    pub fn new(
        inbound: mpsc::UnboundedReceiver<SignalMessage>,
        outbound: mpsc::UnboundedSender<SignalMessage>,
    ) -> Self {
        Self {
            outbound: Some(outbound),
            inbound,
        }
    }

    pub fn pair() -> (Self, MemoryChannelPeer) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        (
            Self::new(inbound, outbound),
            MemoryChannelPeer {
                to_client,
                from_client,
            },
        )
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_none()
    }
}

#[async_trait]
impl SignalingChannel for MemorySignalingChannel {
    async fn send(&mut self, message: SignalMessage) -> Result<(), CallError> {
        let Some(outbound) = &self.outbound else {
            return Err(CallError::SignalingUnavailable("channel closed".into()));
        };
        outbound
            .send(message)
            .map_err(|_| CallError::SignalingUnavailable("peer end dropped".into()))
    }

    async fn recv(&mut self) -> Option<SignalMessage> {
        if self.outbound.is_none() {
            return None;
        }
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        self.outbound = None;
        self.inbound.close();
    }
}
