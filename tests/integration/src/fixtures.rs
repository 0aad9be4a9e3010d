//! Test fixtures and data generators
//!
//! Provides reusable identities and frames for integration tests.

use chat_core::{ChannelId, Identity, UserId};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};

/// Secret shared by the test server and the tokens it is handed
pub const TEST_SECRET: &str = "integration-test-secret";

/// Counter for unique user ids
static COUNTER: AtomicI64 = AtomicI64::new(1000);

/// A fresh identity with a unique user id
pub fn unique_identity(name: &str) -> Identity {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    Identity::new(UserId::new(id), format!("{name}{id}"))
}

/// Chat frame without an explicit channel
pub fn chat_frame(content: &str) -> Value {
    json!({ "type": "message", "content": content })
}

/// Chat frame addressed to a channel
pub fn chat_frame_to(channel_id: ChannelId, content: &str) -> Value {
    json!({ "type": "message", "content": content, "channel_id": channel_id })
}

/// Channel switch frame
pub fn switch_frame(channel_id: ChannelId) -> Value {
    json!({ "type": "switch_channel", "channel_id": channel_id })
}
