//! Wire and event types exchanged with agents.

mod event;
mod token;
mod wire;

pub use event::StatusEvent;
pub use token::BearerToken;
pub use wire::{DispatchAck, TaskCreateRequest};
