//! Per-connection session plumbing
//!
//! A session is one admitted WebSocket connection. The hub only ever sees its
//! [`SessionHandle`]; the socket itself is driven by the read and write pumps.

mod error;
mod pumps;
mod session;

pub use error::SessionError;
pub use pumps::{read_pump, run_session, write_pump, SessionSettings};
pub use session::{Outbox, SessionHandle, SessionId};
