use crate::signaling::SignalingChannel;
use async_trait::async_trait;
use duet_core::{CallError, SignalMessage};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Signaling over the relay's WebSocket route.
pub struct WsSignalingChannel {
    outbound: Option<mpsc::UnboundedSender<SignalMessage>>,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl WsSignalingChannel {
    /// Opens the socket. Failure is reported here, not on the first send.
    pub async fn connect(url: &Url) -> Result<Self, CallError> {
        let (ws_stream, _) = connect_async(url.as_str()).await.map_err(|e| {
            CallError::SignalingUnavailable(format!("websocket connect to {url} failed: {e}"))
        })?;
        info!("Signaling connected to {}", url);

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (outbound, mut send_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (recv_tx, inbound) = mpsc::unbounded_channel::<SignalMessage>();

        let writer = tokio::spawn(async move {
            while let Some(message) = send_rx.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {}: {}", message.event_name(), e);
                        continue;
                    }
                };
                if ws_write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(message) => {
                                if recv_tx.send(message).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid message from relay: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling socket error: {}", e);
                        break;
                    }
                }
            }
            debug!("Signaling reader finished");
        });

        Ok(Self {
            outbound: Some(outbound),
            inbound,
            writer: Some(writer),
            reader: Some(reader),
        })
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn send(&mut self, message: SignalMessage) -> Result<(), CallError> {
        let Some(outbound) = &self.outbound else {
            return Err(CallError::SignalingUnavailable("channel closed".into()));
        };
        outbound
            .send(message)
            .map_err(|_| CallError::SignalingUnavailable("websocket writer stopped".into()))
    }

    async fn recv(&mut self) -> Option<SignalMessage> {
        if self.outbound.is_none() {
            return None;
        }
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        // Dropping the sender lets the writer flush queued messages and send
        // the close frame.
        self.outbound = None;
        if let Some(writer) = self.writer.take()
            && tokio::time::timeout(CLOSE_GRACE, writer).await.is_err()
        {
            warn!("Signaling writer did not finish within {:?}", CLOSE_GRACE);
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.inbound.close();
    }
}

impl Drop for WsSignalingChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
