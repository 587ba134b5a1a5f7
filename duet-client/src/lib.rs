mod call;
mod config;
mod media;
mod negotiator;
mod room_lookup;
mod signaling;
mod transport;

pub use call::*;
pub use config::{ClientConfig, SIGNALING_URL_ENV};
pub use media::*;
pub use negotiator::*;
pub use room_lookup::{RoomLookupError, lookup_room};
pub use signaling::*;
pub use transport::*;

pub use duet_core::{CallError, ConnectionId, RoomId};
