//! In-process implementation of MessageStore
//!
//! Keeps everything in memory behind a single `parking_lot::RwLock`. Used when
//! no `DATABASE_URL` is configured and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use chat_core::{ChannelId, DomainError, MessageStore, RepoResult, StoredMessage, UserId};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    messages: HashMap<ChannelId, Vec<StoredMessage>>,
    usernames: HashMap<UserId, String>,
    read_status: HashMap<(UserId, ChannelId), DateTime<Utc>>,
}

/// In-memory message store
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    inner: RwLock<Inner>,
}

impl MemoryMessageStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display name so stored messages can be joined with it
    pub fn remember_user(&self, user_id: UserId, username: impl Into<String>) {
        self.inner.write().usernames.insert(user_id, username.into());
    }

    /// Builder form of [`remember_user`](Self::remember_user)
    #[must_use]
    pub fn with_user(self, user_id: UserId, username: impl Into<String>) -> Self {
        self.remember_user(user_id, username);
        self
    }

    /// Insert a message with an explicit timestamp, returning its id
    pub fn insert_at(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let mut inner = self.inner.write();
        inner.last_id += 1;
        let id = inner.last_id;
        let username = inner
            .usernames
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| format!("user{user_id}"));

        inner.messages.entry(channel_id).or_default().push(StoredMessage {
            id,
            channel_id,
            user_id,
            username,
            content: content.into(),
            created_at,
        });
        id
    }

    /// Number of messages stored for a channel
    pub fn message_count(&self, channel_id: ChannelId) -> usize {
        self.inner
            .read()
            .messages
            .get(&channel_id)
            .map_or(0, Vec::len)
    }

    /// Snapshot of a channel's messages in insertion order
    pub fn messages(&self, channel_id: ChannelId) -> Vec<StoredMessage> {
        self.inner
            .read()
            .messages
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Last time the user marked the channel read
    pub fn last_read(&self, user_id: UserId, channel_id: ChannelId) -> Option<DateTime<Utc>> {
        self.inner.read().read_status.get(&(user_id, channel_id)).copied()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save_message(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<()> {
        if content.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        self.insert_at(channel_id, user_id, content, Utc::now());
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>> {
        let mut messages = self.messages(channel_id);
        // Newest first, ties broken by insertion order
        messages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn mark_channel_read(&self, user_id: UserId, channel_id: ChannelId) -> RepoResult<()> {
        self.inner
            .write()
            .read_status
            .insert((user_id, channel_id), Utc::now());
        Ok(())
    }

    async fn unread_channels(&self, user_id: UserId) -> RepoResult<Vec<ChannelId>> {
        let inner = self.inner.read();
        let mut unread: Vec<ChannelId> = inner
            .messages
            .iter()
            .filter(|(channel_id, messages)| {
                let last_read = inner.read_status.get(&(user_id, **channel_id));
                messages.iter().any(|m| {
                    m.user_id != user_id && last_read.map_or(true, |read| m.created_at > *read)
                })
            })
            .map(|(channel_id, _)| *channel_id)
            .collect();
        unread.sort();
        Ok(unread)
    }
}
