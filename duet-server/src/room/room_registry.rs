use crate::room::{JoinError, Room, RoomPhase};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use duet_core::{ConnectionId, RoomId, SignalMessage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    /// Members that were already present, in join order.
    pub members: Vec<ConnectionId>,
    pub already_member: bool,
}

/// Tracks which connections are in which room and routes signals between them.
///
/// Each room lives in its own `DashMap` entry, so the entry lock serializes
/// join, relay and leave for that room. Notifications are queued while the
/// entry is held, which keeps them ordered with the membership change.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ConnectionId, RoomId>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomRegistry {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            signaling,
        }
    }

    pub fn create_room(&self) -> RoomId {
        let room_id = RoomId::generate();
        self.rooms.insert(room_id.clone(), Room::new(room_id.clone()));
        info!("Created room {}", room_id);
        room_id
    }

    pub fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
    ) -> Result<JoinOutcome, JoinError> {
        let current = self
            .memberships
            .get(&connection_id)
            .map(|entry| entry.value().clone());

        match current {
            Some(current) if &current == room_id => {
                let members = self
                    .rooms
                    .get(room_id)
                    .map(|room| room.others(&connection_id).copied().collect())
                    .unwrap_or_default();
                debug!("{} re-joined room {}", connection_id, room_id);
                return Ok(JoinOutcome {
                    room_id: room_id.clone(),
                    members,
                    already_member: true,
                });
            }
            Some(_) => {
                self.leave(&connection_id);
            }
            None => {}
        }

        let mut room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone()));

        if let Err(e) = room.admit(connection_id) {
            warn!("Join of {} rejected: {}", connection_id, e);
            return Err(e);
        }
        self.memberships.insert(connection_id, room_id.clone());

        let members: Vec<ConnectionId> = room.others(&connection_id).copied().collect();
        for member in &members {
            self.signaling.deliver(
                member,
                SignalMessage::UserConnected {
                    room_id: room_id.clone(),
                    connection_id,
                },
            );
        }

        info!(
            "{} joined room {} ({:?})",
            connection_id,
            room_id,
            room.phase()
        );

        Ok(JoinOutcome {
            room_id: room_id.clone(),
            members,
            already_member: false,
        })
    }

    /// Forwards a relayable message to every other member of the sender's room.
    /// Returns the number of recipients; zero means the message was dropped.
    pub fn relay(&self, from: &ConnectionId, message: SignalMessage) -> usize {
        let Some(room_id) = message.room_id().cloned() else {
            return 0;
        };

        let Some(mut room) = self.rooms.get_mut(&room_id) else {
            debug!("Dropping {} for unknown room {}", message.event_name(), room_id);
            return 0;
        };

        if !room.contains(from) {
            warn!(
                "{} sent {} to room {} without being a member",
                from,
                message.event_name(),
                room_id
            );
            return 0;
        }
        room.touch();

        let recipients: Vec<ConnectionId> = room.others(from).copied().collect();
        if recipients.is_empty() {
            debug!(
                "Dropping {} from {}: room {} has no other member",
                message.event_name(),
                from,
                room_id
            );
            return 0;
        }

        let mut delivered = 0;
        for recipient in &recipients {
            if self.signaling.deliver(recipient, message.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Removes the connection from its room, if any, and tells the remaining
    /// members. Empty rooms are destroyed.
    pub fn leave(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let (_, room_id) = self.memberships.remove(connection_id)?;

        let now_empty = match self.rooms.get_mut(&room_id) {
            Some(mut room) => {
                if room.remove(connection_id) {
                    for member in room.members() {
                        self.signaling.deliver(
                            member,
                            SignalMessage::UserDisconnected {
                                room_id: room_id.clone(),
                                connection_id: *connection_id,
                            },
                        );
                    }
                }
                info!(
                    "{} left room {} ({:?})",
                    connection_id,
                    room_id,
                    room.phase()
                );
                room.is_empty()
            }
            None => false,
        };

        if now_empty && self.rooms.remove_if(&room_id, |_, room| room.is_empty()).is_some() {
            info!("Room {} destroyed", room_id);
        }

        Some(room_id)
    }

    /// Drops empty rooms that saw no activity for `max_idle`.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.rooms.len();
        self.rooms
            .retain(|_, room| !(room.is_empty() && room.idle_for() >= max_idle));
        let swept = before.saturating_sub(self.rooms.len());
        if swept > 0 {
            info!("Swept {} idle rooms", swept);
        }
        swept
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.memberships
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.members().len())
            .unwrap_or(0)
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_phase(&self, room_id: &RoomId) -> Option<RoomPhase> {
        self.rooms.get(room_id).map(|room| room.phase())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
