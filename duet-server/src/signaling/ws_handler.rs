use crate::Relay;
use crate::signaling::SignalingOutput;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use duet_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(relay): State<Relay>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Relay) {
    let (connection_id, mut rx) = relay.attach();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize {}: {}", msg.event_name(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => relay.handle_message(connection_id, signal),
                        Err(e) => {
                            warn!("Invalid SignalMessage from {}: {}", connection_id, e);
                            relay.signaling().deliver(
                                &connection_id,
                                SignalMessage::Error {
                                    message: format!("invalid message: {e}"),
                                },
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.detach(&connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}
