//! Message database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Row of `messages` joined with the author's `users.username`
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// Single-column row returned by the unread-channels query
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UnreadChannelModel {
    pub channel_id: i64,
}
