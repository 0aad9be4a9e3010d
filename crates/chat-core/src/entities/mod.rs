//! Domain entities - core business objects

mod identity;
mod message;

pub use identity::Identity;
pub use message::StoredMessage;
