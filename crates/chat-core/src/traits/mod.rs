//! Ports - interfaces the domain needs from infrastructure

mod message_store;

pub use message_store::{MessageStore, RepoResult};
