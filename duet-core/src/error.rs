use std::time::Duration;
use thiserror::Error;

/// Failure conditions of a two-party call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    #[error("a negotiation is already in progress")]
    AlreadyNegotiating,

    #[error("received an answer without an outstanding offer")]
    UnexpectedAnswer,

    #[error("room already has two participants")]
    RoomFull,

    #[error("no other participant in the room yet")]
    NoRemotePeer,

    #[error("local media unavailable: {0}")]
    MediaAcquisitionFailed(String),

    #[error("signaling unavailable: {0}")]
    SignalingUnavailable(String),

    #[error("remote candidate queue exceeded its capacity of {capacity}")]
    CandidateOverflow { capacity: usize },

    #[error("call was not established within {0:?}")]
    SetupTimeout(Duration),

    #[error("session is closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

impl CallError {
    /// Per-event failures are dropped and the call carries on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CallError::InvalidSignal(_)
                | CallError::AlreadyNegotiating
                | CallError::UnexpectedAnswer
                | CallError::NoRemotePeer
                | CallError::Transport(_)
                | CallError::Closed
        )
    }
}
