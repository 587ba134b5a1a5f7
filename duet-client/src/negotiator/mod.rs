mod candidate_queue;
mod negotiation_state;
mod session_negotiator;

pub use candidate_queue::*;
pub use negotiation_state::*;
pub use session_negotiator::*;
