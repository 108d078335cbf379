use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, UserId};

use crate::channel::ChannelHandle;

/// Per-group configuration, one row per group chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// The group chat.
    pub group_id: ChatId,
    /// Last observed title.
    pub title: String,
    /// The user who first triggered registration of the group.
    pub added_by: UserId,
    /// Secondary channel chosen by the group's admins.
    pub customer_channel: Option<ChannelHandle>,
    /// Never true while `customer_channel` is `None`.
    pub customer_channel_required: bool,
    /// When the group was first seen.
    pub created_at: DateTime<Utc>,
    /// Last registration refresh or configuration change.
    pub updated_at: DateTime<Utc>,
}

impl GroupConfig {
    /// The secondary channel members must join, if the group requires one.
    pub fn required_customer_channel(&self) -> Option<&ChannelHandle> {
        self.customer_channel.as_ref().filter(|_| self.customer_channel_required)
    }
}
