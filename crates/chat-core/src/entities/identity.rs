//! Identity bound to a connection at admission

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Verified user identity
///
/// Produced by token verification before a connection is admitted and never
/// changed for the lifetime of that connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl Identity {
    /// Create a new identity
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.username, self.user_id)
    }
}
