pub mod error;
pub mod model;

pub use error::CallError;
pub use model::*;
