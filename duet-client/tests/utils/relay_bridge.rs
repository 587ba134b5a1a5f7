use duet_client::MemorySignalingChannel;
use duet_server::Relay;
use tokio::sync::mpsc;

/// Connects an in-memory channel to `relay` as a new connection. Closing the
/// channel detaches the connection, like a dropped socket.
pub fn connect_to_relay(relay: &Relay) -> MemorySignalingChannel {
    let (connection_id, inbound) = relay.attach();
    let (outbound, mut from_client) = mpsc::unbounded_channel();
    let relay = relay.clone();

    tokio::spawn(async move {
        while let Some(message) = from_client.recv().await {
            relay.handle_message(connection_id, message);
        }
        relay.detach(&connection_id);
    });

    MemorySignalingChannel::new(inbound, outbound)
}
