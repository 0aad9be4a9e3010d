//! Hub state and the operations applied to it
//!
//! Owned by exactly one task. Every method runs to completion without awaiting;
//! store work is spawned and the resulting join handles are returned so callers
//! can ignore or await them.

use super::background::{spawn_persist, spawn_replay, Replay, ReplayTicket};
use super::membership::Membership;
use super::{HubSettings, HubStats};
use crate::connection::{SessionHandle, SessionId};
use crate::protocol::{ChatDelivered, ServerMessage};
use chat_core::{ChannelId, MessageStore, UserId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{error::TrySendError, WeakSender};
use tokio::task::{AbortHandle, JoinHandle};

/// Outcome of one broadcast
#[derive(Debug)]
pub(crate) struct Delivery {
    pub delivered: usize,
    pub evicted: Vec<SessionId>,
    pub persist: JoinHandle<()>,
}

/// The replay currently feeding a session's outbox
struct ActiveReplay {
    ticket: ReplayTicket,
    task: AbortHandle,
}

impl ActiveReplay {
    fn cancel(self) {
        self.ticket.revoke();
        self.task.abort();
    }
}

pub(crate) struct Router {
    membership: Membership,
    replays: HashMap<SessionId, ActiveReplay>,
    store: Arc<dyn MessageStore>,
    settings: HubSettings,
}

impl Router {
    pub(crate) fn new(store: Arc<dyn MessageStore>, settings: HubSettings) -> Self {
        Self {
            membership: Membership::new(),
            replays: HashMap::new(),
            store,
            settings,
        }
    }

    /// Admit a session into the general channel and start its history replay
    pub(crate) fn register(&mut self, handle: SessionHandle) -> JoinHandle<()> {
        let session_id = handle.id();
        let user_id = handle.identity().user_id;
        let outbox = handle.downgrade();

        tracing::info!(
            session_id = %session_id,
            user = %handle.identity(),
            "Session registered"
        );
        self.membership.insert(handle, ChannelId::GENERAL);

        self.replay(outbox, session_id, user_id, ChannelId::GENERAL)
    }

    /// Drop a session; returns false if it was not registered
    pub(crate) fn unregister(&mut self, session_id: SessionId) -> bool {
        if let Some(replay) = self.replays.remove(&session_id) {
            replay.cancel();
        }
        match self.membership.remove(session_id) {
            Some(handle) => {
                tracing::info!(
                    session_id = %session_id,
                    user = %handle.identity(),
                    "Session unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Move a session to `channel_id` and replay that channel's history
    ///
    /// Any replay still running for the previous channel is cancelled.
    /// Non-positive channels and unknown sessions are ignored.
    pub(crate) fn switch_channel(
        &mut self,
        session_id: SessionId,
        channel_id: ChannelId,
    ) -> Option<JoinHandle<()>> {
        if !channel_id.is_valid() {
            tracing::debug!(session_id = %session_id, channel_id = %channel_id, "Ignoring switch to invalid channel");
            return None;
        }

        let from = self.membership.move_to(session_id, channel_id)?;
        let handle = self.membership.get(session_id)?;
        let user_id = handle.identity().user_id;
        let outbox = handle.downgrade();

        tracing::debug!(
            session_id = %session_id,
            from = %from,
            to = %channel_id,
            "Session switched channel"
        );

        Some(self.replay(outbox, session_id, user_id, channel_id))
    }

    /// Fan a chat message out to every member of `channel_id`, then persist it
    ///
    /// Members whose outbox is full or closed are evicted. Returns `None` when
    /// the origin is no longer registered or the content is blank.
    pub(crate) fn broadcast(
        &mut self,
        origin: SessionId,
        channel_id: ChannelId,
        content: String,
    ) -> Option<Delivery> {
        if content.trim().is_empty() {
            return None;
        }
        let Some(sender) = self.membership.get(origin).map(|h| h.identity().clone()) else {
            tracing::debug!(session_id = %origin, "Dropping message from unregistered session");
            return None;
        };

        let message = ServerMessage::Chat(ChatDelivered {
            content: content.clone(),
            channel_id,
            user_id: sender.user_id,
            username: sender.username,
            timestamp: Utc::now(),
        });

        let mut delivered = 0;
        let mut evicted = Vec::new();
        for member in self.membership.members(channel_id) {
            match member.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %member.id(),
                        channel_id = %channel_id,
                        "Outbox full, evicting slow session"
                    );
                    evicted.push(member.id());
                }
                Err(TrySendError::Closed(_)) => evicted.push(member.id()),
            }
        }
        for session_id in &evicted {
            self.unregister(*session_id);
        }

        let persist = spawn_persist(
            Arc::clone(&self.store),
            channel_id,
            sender.user_id,
            content,
            self.settings.store_timeout,
        );

        Some(Delivery {
            delivered,
            evicted,
            persist,
        })
    }

    pub(crate) fn stats(&self) -> HubStats {
        HubStats {
            sessions: self.membership.session_count(),
            channels: self.membership.channel_count(),
        }
    }

    #[cfg(test)]
    pub(crate) fn channel_of(&self, session_id: SessionId) -> Option<ChannelId> {
        self.membership.channel_of(session_id)
    }

    /// Drop every session, closing all outboxes
    pub(crate) fn close_all(&mut self) -> usize {
        for (_, replay) in self.replays.drain() {
            replay.cancel();
        }
        self.membership.clear()
    }

    fn replay(
        &mut self,
        outbox: WeakSender<ServerMessage>,
        session_id: SessionId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> JoinHandle<()> {
        if let Some(previous) = self.replays.remove(&session_id) {
            previous.cancel();
        }

        let ticket = ReplayTicket::default();
        let task = spawn_replay(
            Arc::clone(&self.store),
            outbox,
            Replay {
                session_id,
                user_id,
                channel_id,
                limit: self.settings.history_limit,
                deadline: self.settings.store_timeout,
            },
            ticket.clone(),
        );
        self.replays.insert(
            session_id,
            ActiveReplay {
                ticket,
                task: task.abort_handle(),
            },
        );
        task
    }
}
