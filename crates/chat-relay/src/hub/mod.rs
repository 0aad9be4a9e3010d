//! The hub: single owner of channel membership
//!
//! Sessions never touch membership directly. They talk to the hub task through
//! a [`HubHandle`]; the task applies each request in turn, so no locks guard
//! the membership table.

mod background;
mod handle;
mod membership;
mod router;


pub use handle::{HubError, HubHandle, HubStats};

pub(crate) use handle::HubRequest;
use router::Router;

use crate::connection::{SessionHandle, SessionId};
use chat_common::RelayConfig;
use chat_core::MessageStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Hub tuning
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Messages replayed when a session enters a channel
    pub history_limit: usize,
    /// Deadline for each store call
    pub store_timeout: Duration,
    /// Capacity of the bounded inbound queue
    pub inbound_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for HubSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            store_timeout: config.store_timeout(),
            inbound_capacity: config.inbound_capacity,
        }
    }
}

/// The hub task
pub struct Hub {
    router: Router,
    register_rx: mpsc::UnboundedReceiver<SessionHandle>,
    unregister_rx: mpsc::UnboundedReceiver<SessionId>,
    inbound_rx: mpsc::Receiver<HubRequest>,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    pub fn new(store: Arc<dyn MessageStore>, settings: HubSettings) -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(settings.inbound_capacity.max(1));

        let hub = Self {
            router: Router::new(store, settings),
            register_rx,
            unregister_rx,
            inbound_rx,
        };
        (hub, HubHandle::new(register_tx, unregister_tx, inbound_tx))
    }

    /// Run until `shutdown` resolves or every handle is dropped
    ///
    /// Pending registrations are taken before unregistrations, and both before
    /// inbound traffic, so a session's first frames always find it registered.
    /// On exit every session's outbox is closed.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self {
            mut router,
            mut register_rx,
            mut unregister_rx,
            mut inbound_rx,
        } = self;
        tokio::pin!(shutdown);

        tracing::info!("Hub started");

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!("Hub shutdown requested");
                    break;
                }
                Some(handle) = register_rx.recv() => {
                    router.register(handle);
                }
                Some(session_id) = unregister_rx.recv() => {
                    router.unregister(session_id);
                }
                Some(request) = inbound_rx.recv() => {
                    handle_request(&mut router, request);
                }
                else => break,
            }
        }

        let closed = router.close_all();
        tracing::info!(sessions = closed, "Hub stopped");
    }
}

fn handle_request(router: &mut Router, request: HubRequest) {
    match request {
        HubRequest::Broadcast {
            origin,
            channel_id,
            content,
        } => {
            if let Some(delivery) = router.broadcast(origin, channel_id, content) {
                tracing::trace!(
                    channel_id = %channel_id,
                    delivered = delivery.delivered,
                    evicted = delivery.evicted.len(),
                    "Broadcast complete"
                );
            }
        }
        HubRequest::SwitchChannel {
            session_id,
            channel_id,
        } => {
            router.switch_channel(session_id, channel_id);
        }
        HubRequest::Stats(reply) => {
            let _ = reply.send(router.stats());
        }
    }
}
