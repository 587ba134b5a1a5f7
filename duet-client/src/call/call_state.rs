use crate::negotiator::{ConnectionHealth, IceState, NegotiationState};
use duet_core::{CallError, ConnectionId, RoomId};

/// Read-only view of a call, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSnapshot {
    pub room_id: RoomId,
    pub local_id: Option<ConnectionId>,
    pub remote_id: Option<ConnectionId>,
    pub negotiation: NegotiationState,
    pub ice: IceState,
    pub health: ConnectionHealth,
    /// An offer was sent or answered and the session has not been torn down.
    pub calling: bool,
    pub microphone_enabled: bool,
    pub camera_enabled: bool,
    pub last_error: Option<CallError>,
    /// The controller loop has stopped.
    pub finished: bool,
}

impl CallSnapshot {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            local_id: None,
            remote_id: None,
            negotiation: NegotiationState::Idle,
            ice: IceState::New,
            health: ConnectionHealth::Negotiating,
            calling: false,
            microphone_enabled: true,
            camera_enabled: true,
            last_error: None,
            finished: false,
        }
    }

    pub fn joined(&self) -> bool {
        self.local_id.is_some()
    }

    /// Participants currently in the room, this one included.
    pub fn participants(&self) -> usize {
        usize::from(self.local_id.is_some()) + usize::from(self.remote_id.is_some())
    }

    pub fn is_stable(&self) -> bool {
        self.negotiation == NegotiationState::Stable
    }
}
