//! Channel membership table
//!
//! Every registered session belongs to exactly one channel. Channels with no
//! members are dropped from the table.

use crate::connection::{SessionHandle, SessionId};
use chat_core::ChannelId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Membership {
    channels: HashMap<ChannelId, HashMap<SessionId, SessionHandle>>,
    index: HashMap<SessionId, ChannelId>,
}

impl Membership {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Place a session in a channel, replacing any earlier entry for the same id
    pub(crate) fn insert(&mut self, handle: SessionHandle, channel_id: ChannelId) {
        let id = handle.id();
        self.remove(id);
        self.channels
            .entry(channel_id)
            .or_default()
            .insert(id, handle);
        self.index.insert(id, channel_id);
    }

    /// Take a session out of the table, handing back its handle
    pub(crate) fn remove(&mut self, id: SessionId) -> Option<SessionHandle> {
        let channel_id = self.index.remove(&id)?;
        let members = self.channels.get_mut(&channel_id)?;
        let handle = members.remove(&id);
        if members.is_empty() {
            self.channels.remove(&channel_id);
        }
        handle
    }

    /// Move a registered session, returning the channel it left
    pub(crate) fn move_to(&mut self, id: SessionId, channel_id: ChannelId) -> Option<ChannelId> {
        let from = *self.index.get(&id)?;
        if from == channel_id {
            return Some(from);
        }
        let handle = self.remove(id)?;
        self.insert(handle, channel_id);
        Some(from)
    }

    pub(crate) fn get(&self, id: SessionId) -> Option<&SessionHandle> {
        let channel_id = self.index.get(&id)?;
        self.channels.get(channel_id)?.get(&id)
    }

    #[cfg(test)]
    pub(crate) fn channel_of(&self, id: SessionId) -> Option<ChannelId> {
        self.index.get(&id).copied()
    }

    pub(crate) fn members(&self, channel_id: ChannelId) -> impl Iterator<Item = &SessionHandle> {
        self.channels
            .get(&channel_id)
            .into_iter()
            .flat_map(HashMap::values)
    }

    #[cfg(test)]
    pub(crate) fn member_count(&self, channel_id: ChannelId) -> usize {
        self.channels.get(&channel_id).map_or(0, HashMap::len)
    }

    pub(crate) fn session_count(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Empty the table, dropping every handle
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.index.len();
        self.channels.clear();
        self.index.clear();
        count
    }
}
