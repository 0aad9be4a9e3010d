//! Cloneable front door to the hub task

use crate::connection::{SessionHandle, SessionId};
use chat_core::ChannelId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Hub error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub task has stopped
    #[error("Hub is not running")]
    Closed,
}

/// Point-in-time membership counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStats {
    pub sessions: usize,
    pub channels: usize,
}

/// Requests carried on the bounded inbound queue
#[derive(Debug)]
pub(crate) enum HubRequest {
    Broadcast {
        origin: SessionId,
        channel_id: ChannelId,
        content: String,
    },
    SwitchChannel {
        session_id: SessionId,
        channel_id: ChannelId,
    },
    Stats(oneshot::Sender<HubStats>),
}

/// Handle used by sessions and the HTTP layer to talk to the hub
///
/// Register and unregister travel on unbounded queues so joining and leaving
/// never wait behind chat traffic. Everything else shares the bounded inbound
/// queue and applies backpressure to the sending session.
#[derive(Debug, Clone)]
pub struct HubHandle {
    register_tx: mpsc::UnboundedSender<SessionHandle>,
    unregister_tx: mpsc::UnboundedSender<SessionId>,
    inbound_tx: mpsc::Sender<HubRequest>,
}

impl HubHandle {
    pub(crate) fn new(
        register_tx: mpsc::UnboundedSender<SessionHandle>,
        unregister_tx: mpsc::UnboundedSender<SessionId>,
        inbound_tx: mpsc::Sender<HubRequest>,
    ) -> Self {
        Self {
            register_tx,
            unregister_tx,
            inbound_tx,
        }
    }

    /// Hand a new session to the hub; it joins the general channel
    pub fn register(&self, session: SessionHandle) -> Result<(), HubError> {
        self.register_tx.send(session).map_err(|_| HubError::Closed)
    }

    /// Ask the hub to drop a session; unknown ids are ignored
    pub fn unregister(&self, session_id: SessionId) -> Result<(), HubError> {
        self.unregister_tx
            .send(session_id)
            .map_err(|_| HubError::Closed)
    }

    /// Relay chat content from `origin` to everyone in `channel_id`
    pub async fn broadcast(
        &self,
        origin: SessionId,
        channel_id: ChannelId,
        content: String,
    ) -> Result<(), HubError> {
        self.request(HubRequest::Broadcast {
            origin,
            channel_id,
            content,
        })
        .await
    }

    /// Move a session to another channel
    pub async fn switch_channel(
        &self,
        session_id: SessionId,
        channel_id: ChannelId,
    ) -> Result<(), HubError> {
        self.request(HubRequest::SwitchChannel {
            session_id,
            channel_id,
        })
        .await
    }

    /// Current session and channel counts
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (tx, rx) = oneshot::channel();
        self.request(HubRequest::Stats(tx)).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn request(&self, request: HubRequest) -> Result<(), HubError> {
        self.inbound_tx
            .send(request)
            .await
            .map_err(|_| HubError::Closed)
    }
}
