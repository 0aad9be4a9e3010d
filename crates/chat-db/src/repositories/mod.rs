//! Message store implementations
//!
//! Implementations of the `MessageStore` port defined in chat-core.

mod error;
mod memory;
mod message;

pub use memory::MemoryMessageStore;
pub use message::PgMessageStore;
