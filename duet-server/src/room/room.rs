use duet_core::{ConnectionId, RoomId};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Maximum number of members a room admits.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Empty,
    Waiting,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("room {0} already has two participants")]
    RoomFull(RoomId),
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    /// Members in join order.
    members: Vec<ConnectionId>,
    created_at: Instant,
    last_activity: Instant,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        let now = Instant::now();
        Self {
            id,
            members: Vec::with_capacity(ROOM_CAPACITY),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        match self.members.len() {
            0 => RoomPhase::Empty,
            1 => RoomPhase::Waiting,
            _ => RoomPhase::Active,
        }
    }

    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    /// Every member except `connection_id`.
    pub fn others<'a>(
        &'a self,
        connection_id: &'a ConnectionId,
    ) -> impl Iterator<Item = &'a ConnectionId> + 'a {
        self.members.iter().filter(move |m| *m != connection_id)
    }

    pub(crate) fn admit(&mut self, connection_id: ConnectionId) -> Result<(), JoinError> {
        if self.is_full() {
            return Err(JoinError::RoomFull(self.id.clone()));
        }
        self.members.push(connection_id);
        self.touch();
        Ok(())
    }

    pub(crate) fn remove(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != connection_id);
        self.touch();
        self.members.len() != before
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}
