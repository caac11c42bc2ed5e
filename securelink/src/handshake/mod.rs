// Handshake module declarations

pub mod messages;
pub mod protocol;
pub mod state;

pub use protocol::{Initiator, Responder};
