use crate::media::RemoteStream;
use crate::negotiator::IceState;
use duet_core::Candidate;

/// Events the peer connection raises from its own callbacks. Each carries the
/// generation of the transport that produced it so that events from a
/// replaced transport can be discarded.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    LocalCandidate(u64, Candidate),
    RemoteTrack(u64, RemoteStream),
    IceStateChanged(u64, IceState),
}

impl TransportEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TransportEvent::LocalCandidate(generation, _)
            | TransportEvent::RemoteTrack(generation, _)
            | TransportEvent::IceStateChanged(generation, _) => *generation,
        }
    }
}
