use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationState {
    Idle,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Closed,
}

impl NegotiationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationState::Idle => "idle",
            NegotiationState::HaveLocalOffer => "have-local-offer",
            NegotiationState::HaveRemoteOffer => "have-remote-offer",
            NegotiationState::Stable => "stable",
            NegotiationState::Closed => "closed",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ICE connectivity, reported by the transport rather than driven by the
/// negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IceState {
    New,
    Checking,
    Connected,
    Failed,
    Disconnected,
    Closed,
}

impl fmt::Display for IceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IceState::New => "new",
            IceState::Checking => "checking",
            IceState::Connected => "connected",
            IceState::Failed => "failed",
            IceState::Disconnected => "disconnected",
            IceState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionHealth {
    Negotiating,
    Connected,
    Degraded,
    Failed,
    Closed,
}

impl ConnectionHealth {
    pub fn derive(negotiation: NegotiationState, ice: IceState) -> Self {
        match (negotiation, ice) {
            (NegotiationState::Closed, _) | (_, IceState::Closed) => ConnectionHealth::Closed,
            (_, IceState::Failed) => ConnectionHealth::Failed,
            (_, IceState::Disconnected) => ConnectionHealth::Degraded,
            (NegotiationState::Stable, IceState::Connected) => ConnectionHealth::Connected,
            _ => ConnectionHealth::Negotiating,
        }
    }
}

impl fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionHealth::Negotiating => "negotiating",
            ConnectionHealth::Connected => "connected",
            ConnectionHealth::Degraded => "degraded",
            ConnectionHealth::Failed => "failed",
            ConnectionHealth::Closed => "closed",
        };
        f.write_str(name)
    }
}
