//! # chat-core
//!
//! Domain layer containing identifiers, the stored message entity, the identity bound to a
//! connection at admission, and the message store port.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Identity, StoredMessage};
pub use error::DomainError;
pub use traits::{MessageStore, RepoResult};
pub use value_objects::{ChannelId, IdParseError, UserId};
