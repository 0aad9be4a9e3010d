//! Relay state
//!
//! Application state shared by the relay's HTTP handlers.

use crate::connection::SessionSettings;
use crate::hub::HubHandle;
use chat_common::{JwtService, RelayConfig};
use std::sync::Arc;

/// Relay application state
#[derive(Clone)]
pub struct RelayState {
    /// Handle to the running hub
    hub: HubHandle,
    /// Token verification for admission
    jwt: Arc<JwtService>,
    /// Keepalive and frame limits applied to each session
    session_settings: SessionSettings,
}

impl RelayState {
    /// Create a new relay state
    pub fn new(hub: HubHandle, jwt: JwtService, relay: &RelayConfig) -> Self {
        Self {
            hub,
            jwt: Arc::new(jwt),
            session_settings: SessionSettings::from(relay),
        }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn session_settings(&self) -> SessionSettings {
        self.session_settings
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("hub", &self.hub)
            .field("session_settings", &self.session_settings)
            .finish()
    }
}
