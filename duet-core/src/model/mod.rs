mod connection;
mod room;
mod session;
mod signaling;

pub use connection::ConnectionId;
pub use room::{RoomCreated, RoomId};
pub use session::{
    Candidate, RawCandidate, RawSessionDescription, SdpType, SessionDescription,
    ice_ufrags,
};
pub use signaling::SignalMessage;
