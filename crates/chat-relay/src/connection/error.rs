//! Session error types

use thiserror::Error;

/// Why a session ended abnormally
#[derive(Debug, Error)]
pub enum SessionError {
    /// Nothing (not even a pong) arrived within the read deadline
    #[error("Read deadline expired")]
    ReadTimeout,

    /// A write did not complete within the write deadline
    #[error("Write deadline expired")]
    WriteTimeout,

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),

    /// The peer broke the frame contract
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Hub is not running")]
    HubClosed,
}

impl SessionError {
    /// Whether the session ended because the peer went quiet or slow
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadTimeout | Self::WriteTimeout)
    }

    /// Whether the peer sent something the relay refuses
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::FrameTooLarge { .. })
    }
}

impl From<crate::hub::HubError> for SessionError {
    fn from(_: crate::hub::HubError) -> Self {
        Self::HubClosed
    }
}
