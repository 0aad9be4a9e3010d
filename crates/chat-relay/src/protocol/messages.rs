//! Frames exchanged between clients and the relay

use chat_core::{ChannelId, StoredMessage, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A frame sent by a client
///
/// Fields the relay does not know about are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Post a chat message; a missing or zero channel means the general channel
    #[serde(rename = "message")]
    Chat {
        #[serde(default)]
        content: String,
        #[serde(default)]
        channel_id: Option<ChannelId>,
    },

    /// Move this session to another channel
    #[serde(rename = "switch_channel")]
    SwitchChannel { channel_id: ChannelId },

    /// Any other `type`; ignored by the relay
    #[serde(other)]
    Unsupported,
}

impl ClientMessage {
    /// Parse from a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A chat message as delivered to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDelivered {
    pub content: String,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: String,
    /// RFC 3339, UTC
    pub timestamp: DateTime<Utc>,
}

impl From<StoredMessage> for ChatDelivered {
    fn from(message: StoredMessage) -> Self {
        Self {
            content: message.content,
            channel_id: message.channel_id,
            user_id: message.user_id,
            username: message.username,
            timestamp: message.created_at,
        }
    }
}

/// A frame sent by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "message")]
    Chat(ChatDelivered),
}

impl ServerMessage {
    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON text frame
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Channel the frame belongs to
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::Chat(chat) => chat.channel_id,
        }
    }
}

impl From<ChatDelivered> for ServerMessage {
    fn from(chat: ChatDelivered) -> Self {
        Self::Chat(chat)
    }
}

impl From<StoredMessage> for ServerMessage {
    fn from(message: StoredMessage) -> Self {
        Self::Chat(message.into())
    }
}
