//! Session identity and outbox

use crate::protocol::ServerMessage;
use chat_core::Identity;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError, WeakSender};
use uuid::Uuid;

/// Receiving end of a session's outbox, drained by the write pump
pub type Outbox = mpsc::Receiver<ServerMessage>;

/// Unique id of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The hub's view of a session: who it is and where to send frames
///
/// Dropping the handle drops the only strong sender, which closes the outbox
/// and tells the write pump to finish.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    identity: Identity,
    outbox: mpsc::Sender<ServerMessage>,
}

impl SessionHandle {
    /// Create a handle with a fresh id and a bounded outbox
    pub fn new(identity: Identity, capacity: usize) -> (Self, Outbox) {
        let (outbox, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: SessionId::generate(),
            identity,
            outbox,
        };
        (handle, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Enqueue without waiting
    pub fn try_send(&self, message: ServerMessage) -> Result<(), TrySendError<ServerMessage>> {
        self.outbox.try_send(message)
    }

    /// A sender that does not keep the outbox open
    pub fn downgrade(&self) -> WeakSender<ServerMessage> {
        self.outbox.downgrade()
    }
}
