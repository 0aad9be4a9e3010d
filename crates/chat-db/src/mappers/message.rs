//! Message model -> entity mapper

use chat_core::{ChannelId, StoredMessage, UserId};

use crate::models::{MessageModel, UnreadChannelModel};

/// Convert MessageModel to StoredMessage entity
impl From<MessageModel> for StoredMessage {
    fn from(model: MessageModel) -> Self {
        StoredMessage {
            id: model.id,
            channel_id: ChannelId::new(model.channel_id),
            user_id: UserId::new(model.user_id),
            username: model.username,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

impl From<UnreadChannelModel> for ChannelId {
    fn from(model: UnreadChannelModel) -> Self {
        ChannelId::new(model.channel_id)
    }
}
