//! PostgreSQL implementation of MessageStore

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use chat_core::{ChannelId, MessageStore, RepoResult, StoredMessage, UserId};

use crate::models::{MessageModel, UnreadChannelModel};

use super::error::map_db_error;

/// PostgreSQL implementation of MessageStore
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Create a new PgMessageStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    #[instrument(skip(self, content))]
    async fn save_message(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: &str,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (channel_id, user_id, content)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(user_id.into_inner())
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> RepoResult<Vec<StoredMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let results = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT m.id, m.channel_id, m.user_id, m.content, m.created_at, u.username
            FROM messages m
            JOIN users u ON m.user_id = u.id
            WHERE m.channel_id = $1
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2
            "#,
        )
        .bind(channel_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(StoredMessage::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_channel_read(&self, user_id: UserId, channel_id: ChannelId) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO channel_read_status (user_id, channel_id, last_read_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, channel_id)
            DO UPDATE SET last_read_at = NOW()
            "#,
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn unread_channels(&self, user_id: UserId) -> RepoResult<Vec<ChannelId>> {
        let results = sqlx::query_as::<_, UnreadChannelModel>(
            r#"
            SELECT DISTINCT m.channel_id
            FROM messages m
            LEFT JOIN channel_read_status crs
                ON crs.user_id = $1 AND crs.channel_id = m.channel_id
            WHERE (crs.last_read_at IS NULL OR m.created_at > crs.last_read_at)
              AND m.user_id != $1
            ORDER BY m.channel_id
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(ChannelId::from).collect())
    }
}

impl std::fmt::Debug for PgMessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgMessageStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}
