mod inbound;

use async_trait::async_trait;
use mockall::automock;
pub use inbound::{ChatScope, InboundMessage, Sender};
use teloxide::{
    prelude::*,
    types::{ChatMemberStatus, Recipient},
};
use thiserror::Error;

/// Errors from platform queries.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The Telegram request failed.
    #[error("Teloxide API request failed: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),
}

type Result<T> = std::result::Result<T, PlatformError>;

/// A user's standing in a chat or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// Owner of the chat.
    Creator,
    /// Administrator.
    Administrator,
    /// Regular member.
    Member,
    /// Member with restrictions.
    Restricted,
    /// Not a member.
    Left,
    /// Banned.
    Kicked,
}

impl MemberStatus {
    /// Whether this status counts as being subscribed.
    pub fn is_subscribed(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }

    /// Whether this status may manage the chat.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}

impl From<ChatMemberStatus> for MemberStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => Self::Creator,
            ChatMemberStatus::Administrator => Self::Administrator,
            ChatMemberStatus::Member => Self::Member,
            ChatMemberStatus::Restricted => Self::Restricted,
            ChatMemberStatus::Left => Self::Left,
            ChatMemberStatus::Banned => Self::Kicked,
        }
    }
}

/// Read-only queries against the chat platform.
#[automock]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Looks up the status of a user in a chat or channel.
    async fn get_member_status(&self, chat: Recipient, user_id: UserId) -> Result<MemberStatus>;

    /// Checks that the bot can see the given chat.
    async fn probe_chat(&self, chat: Recipient) -> Result<()>;
}

/// Converts a configured channel reference into a request target. Numeric
/// references are chat ids, everything else is a public username.
pub fn recipient_for(channel: &str) -> Recipient {
    let channel = channel.trim();
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel.starts_with('@') => Recipient::ChannelUsername(channel.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel}")),
    }
}

/// Telegram implementation of the platform client.
pub struct TelegramPlatformClient {
    bot: Bot,
}

impl TelegramPlatformClient {
    /// Creates a client over the given bot.
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl PlatformClient for TelegramPlatformClient {
    async fn get_member_status(&self, chat: Recipient, user_id: UserId) -> Result<MemberStatus> {
        let member = self.bot.get_chat_member(chat, user_id).await?;
        Ok(member.status().into())
    }

    async fn probe_chat(&self, chat: Recipient) -> Result<()> {
        self.bot.get_chat(chat).await.map(|_| ()).map_err(PlatformError::TeloxideRequest)
    }
}
