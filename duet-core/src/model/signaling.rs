use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use crate::model::session::{RawCandidate, RawSessionDescription};
use serde::{Deserialize, Serialize};

/// Every event exchanged between a client and the relay.
///
/// Serialized as `{"event": "<kebab-name>", "data": {...camelCase}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    JoinRoom {
        room_id: RoomId,
    },
    Joined {
        room_id: RoomId,
        connection_id: ConnectionId,
        members: Vec<ConnectionId>,
    },
    RoomFull {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    UserConnected {
        room_id: RoomId,
        connection_id: ConnectionId,
    },
    UserDisconnected {
        room_id: RoomId,
        connection_id: ConnectionId,
    },
    Offer {
        room_id: RoomId,
        #[serde(default)]
        description: Option<RawSessionDescription>,
    },
    Answer {
        room_id: RoomId,
        #[serde(default)]
        description: Option<RawSessionDescription>,
    },
    Candidate {
        room_id: RoomId,
        #[serde(default)]
        candidate: Option<RawCandidate>,
    },
    Error {
        message: String,
    },
}

impl SignalMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            SignalMessage::JoinRoom { .. } => "join-room",
            SignalMessage::Joined { .. } => "joined",
            SignalMessage::RoomFull { .. } => "room-full",
            SignalMessage::LeaveRoom { .. } => "leave-room",
            SignalMessage::UserConnected { .. } => "user-connected",
            SignalMessage::UserDisconnected { .. } => "user-disconnected",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::Candidate { .. } => "candidate",
            SignalMessage::Error { .. } => "error",
        }
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            SignalMessage::JoinRoom { room_id }
            | SignalMessage::Joined { room_id, .. }
            | SignalMessage::RoomFull { room_id }
            | SignalMessage::LeaveRoom { room_id }
            | SignalMessage::UserConnected { room_id, .. }
            | SignalMessage::UserDisconnected { room_id, .. }
            | SignalMessage::Offer { room_id, .. }
            | SignalMessage::Answer { room_id, .. }
            | SignalMessage::Candidate { room_id, .. } => Some(room_id),
            SignalMessage::Error { .. } => None,
        }
    }

    /// Events the relay forwards verbatim to the other member of a room.
    pub fn is_relayed(&self) -> bool {
        matches!(
            self,
            SignalMessage::Offer { .. }
                | SignalMessage::Answer { .. }
                | SignalMessage::Candidate { .. }
        )
    }
}
