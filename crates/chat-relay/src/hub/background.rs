//! Store work spawned off the hub task
//!
//! Nothing here is awaited by the hub. Every store call runs under a deadline
//! and failures are logged, never surfaced to clients.

use crate::connection::SessionId;
use crate::protocol::ServerMessage;
use chat_core::{ChannelId, DomainError, MessageStore, RepoResult, UserId};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{error::TrySendError, WeakSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Run a store call, reporting an elapsed deadline as [`DomainError::Timeout`]
async fn bounded<T>(
    deadline: Duration,
    call: impl Future<Output = RepoResult<T>>,
) -> RepoResult<T> {
    match timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Timeout(
            u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

/// Persist a relayed chat message
pub(crate) fn spawn_persist(
    store: Arc<dyn MessageStore>,
    channel_id: ChannelId,
    user_id: UserId,
    content: String,
    deadline: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match bounded(deadline, store.save_message(channel_id, user_id, &content)).await {
            Ok(()) => {
                tracing::trace!(channel_id = %channel_id, user_id = %user_id, "Message persisted");
            }
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel_id,
                    user_id = %user_id,
                    error = %e,
                    "Failed to persist message"
                );
            }
        }
    })
}

/// Parameters for one history replay
#[derive(Debug, Clone, Copy)]
pub(crate) struct Replay {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub limit: usize,
    pub deadline: Duration,
}

/// Revocation flag shared between the hub and one replay task
///
/// Frames are enqueued while holding the lock, so once [`revoke`](Self::revoke)
/// returns no further history from that replay reaches the outbox.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReplayTicket(Arc<Mutex<bool>>);

impl ReplayTicket {
    pub(crate) fn revoke(&self) {
        *self.0.lock() = true;
    }

    fn is_revoked(&self) -> bool {
        *self.0.lock()
    }
}

/// Send a channel's recent history to one session, oldest first
///
/// Holds only a weak sender so an evicted session's outbox still closes. Once
/// the history has been handed over the channel is marked read for the user.
/// A revoked ticket stops the replay before its next frame.
pub(crate) fn spawn_replay(
    store: Arc<dyn MessageStore>,
    outbox: WeakSender<ServerMessage>,
    replay: Replay,
    ticket: ReplayTicket,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Replay {
            session_id,
            user_id,
            channel_id,
            limit,
            deadline,
        } = replay;

        let history = match bounded(deadline, store.recent_messages(channel_id, limit)).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    channel_id = %channel_id,
                    error = %e,
                    "Failed to load history"
                );
                return;
            }
        };

        let total = history.len();
        let mut sent = 0;
        for message in history.into_iter().rev() {
            let Some(sender) = outbox.upgrade() else {
                return;
            };
            let revoked = ticket.0.lock();
            if *revoked {
                tracing::debug!(session_id = %session_id, channel_id = %channel_id, sent, "Replay superseded");
                return;
            }
            match sender.try_send(ServerMessage::from(message)) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(
                        session_id = %session_id,
                        channel_id = %channel_id,
                        sent,
                        total,
                        "Outbox full, dropping rest of history"
                    );
                    break;
                }
                Err(TrySendError::Closed(_)) => return,
            }
        }

        tracing::debug!(session_id = %session_id, channel_id = %channel_id, sent, "History replayed");

        if ticket.is_revoked() {
            return;
        }

        if let Err(e) = bounded(deadline, store.mark_channel_read(user_id, channel_id)).await {
            tracing::warn!(user_id = %user_id, channel_id = %channel_id, error = %e, "Failed to mark channel read");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_reports_timeout() {
        let result: RepoResult<()> = bounded(Duration::from_millis(250), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DomainError::Timeout(250))));
    }

    #[tokio::test]
    async fn test_bounded_passes_store_errors_through() {
        let result: RepoResult<()> = bounded(Duration::from_secs(1), async {
            Err(DomainError::DatabaseError("down".to_string()))
        })
        .await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    }
}
