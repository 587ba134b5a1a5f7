mod call_command;
mod call_controller;
mod call_handle;
mod call_state;

pub use call_command::*;
pub use call_controller::*;
pub use call_handle::*;
pub use call_state::*;
