use crate::room::{JoinError, RoomRegistry};
use crate::signaling::{SignalingOutput, SignalingService};
use duet_core::{ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Shared relay state: per-connection outbound queues plus the room registry.
#[derive(Clone)]
pub struct Relay {
    signaling: SignalingService,
    registry: RoomRegistry,
}

impl Relay {
    pub fn new() -> Self {
        let signaling = SignalingService::new();
        let registry = RoomRegistry::new(Arc::new(signaling.clone()));
        Self {
            signaling,
            registry,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn signaling(&self) -> &SignalingService {
        &self.signaling
    }

    /// Registers a new connection and returns its outbound queue.
    pub fn attach(&self) -> (ConnectionId, mpsc::UnboundedReceiver<SignalMessage>) {
        let connection_id = ConnectionId::new();
        let rx = self.signaling.attach(connection_id);
        (connection_id, rx)
    }

    /// Transport-level disconnect: leave the room, then drop the queue.
    pub fn detach(&self, connection_id: &ConnectionId) {
        self.registry.leave(connection_id);
        self.signaling.detach(connection_id);
    }

    pub fn handle_message(&self, from: ConnectionId, message: SignalMessage) {
        match message {
            SignalMessage::JoinRoom { room_id } => match self.registry.join(&room_id, from) {
                Ok(outcome) => {
                    self.signaling.deliver(
                        &from,
                        SignalMessage::Joined {
                            room_id: outcome.room_id,
                            connection_id: from,
                            members: outcome.members,
                        },
                    );
                }
                Err(JoinError::RoomFull(room_id)) => {
                    self.signaling
                        .deliver(&from, SignalMessage::RoomFull { room_id });
                }
            },

            SignalMessage::LeaveRoom { room_id } => {
                if self.registry.room_of(&from).as_ref() == Some(&room_id) {
                    self.registry.leave(&from);
                } else {
                    debug!("{} asked to leave room {} it is not in", from, room_id);
                }
            }

            message if message.is_relayed() => {
                self.registry.relay(&from, message);
            }

            other => {
                warn!(
                    "{} sent relay-only event '{}'",
                    from,
                    other.event_name()
                );
                self.signaling.deliver(
                    &from,
                    SignalMessage::Error {
                        message: format!("'{}' cannot be sent by a client", other.event_name()),
                    },
                );
            }
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
