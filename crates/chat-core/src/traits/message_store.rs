//! Message store port
//!
//! The relay treats durable storage as a black box with its own latency and
//! failure profile. The infrastructure layer provides the implementation.

use async_trait::async_trait;

use crate::entities::StoredMessage;
use crate::error::DomainError;
use crate::value_objects::{ChannelId, UserId};

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a chat message
    async fn save_message(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<()>;

    /// Fetch up to `limit` most recent messages of a channel, newest first
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>>;

    /// Record that the user has read the channel up to now
    async fn mark_channel_read(&self, user_id: UserId, channel_id: ChannelId) -> RepoResult<()>;

    /// Channels holding messages from other users newer than the user's last read
    async fn unread_channels(&self, user_id: UserId) -> RepoResult<Vec<ChannelId>>;
}
