//! Relay wire protocol
//!
//! JSON text frames tagged by a `type` field.

mod messages;

pub use messages::{ChatDelivered, ClientMessage, ServerMessage};
