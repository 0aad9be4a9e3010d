//! # chat-relay
//!
//! WebSocket relay that fans chat messages out to everyone in the same channel.

pub mod connection;
pub mod hub;
pub mod protocol;
pub mod server;

pub use connection::{SessionHandle, SessionId, SessionSettings};
pub use hub::{Hub, HubError, HubHandle, HubSettings, HubStats};
pub use server::{create_app, create_relay, run, RelayState};
