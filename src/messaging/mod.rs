mod keyboards;
/// User-facing texts.
pub mod texts;
mod utils;

use async_trait::async_trait;
use mockall::automock;
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode},
    utils::{command::BotCommands, html},
};
use thiserror::Error;

use crate::{
    bot_handler::Command,
    channel::{ChannelHandle, ChannelHandleError},
    gate::RequirementNotice,
    messaging::keyboards::{COMMAND_KEYBOARD, build_requirements_keyboard},
    storage::GroupConfig,
};

/// Errors from outbound Telegram calls.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The Telegram request failed.
    #[error("Teloxide API request failed: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),
}

type Result<T> = std::result::Result<T, MessagingError>;

/// Trait for talking back to users and moderating chats.
#[automock]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Sends the "please subscribe to the owner channel" text.
    async fn send_required_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Sends the group warning listing every required channel. Returns the
    /// id of the sent message.
    async fn send_requirements_msg(&self, notice: &RequirementNotice) -> Result<MessageId>;

    /// Tells a user that they pass every requirement.
    async fn send_access_granted_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Sends a start message with onboarding instructions.
    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Sends a help message to the user.
    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Tells the user that a command only works in groups.
    async fn send_use_in_group_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Explains how to use `/setchannel`.
    async fn send_set_channel_usage_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Rejects a malformed channel reference.
    async fn send_invalid_channel_msg(
        &self,
        chat_id: ChatId,
        error: ChannelHandleError,
    ) -> Result<()>;

    /// Confirms that a secondary channel was saved. `reachable` is false if
    /// the bot could not see the channel.
    async fn send_channel_set_msg(
        &self,
        chat_id: ChatId,
        channel: &ChannelHandle,
        reachable: bool,
    ) -> Result<()>;

    /// Confirms that the secondary channel requirement was removed.
    async fn send_channel_disabled_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Reports the requirements of a group.
    async fn send_status_msg(
        &self,
        chat_id: ChatId,
        customer_channel: Option<ChannelHandle>,
    ) -> Result<()>;

    /// Sends a message to the user that they have no registered groups.
    async fn send_no_groups_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Lists the groups a user registered.
    async fn send_my_groups_msg(&self, chat_id: ChatId, groups: Vec<GroupConfig>) -> Result<()>;

    /// Sends a generic failure message.
    async fn send_error_msg(&self, chat_id: ChatId) -> Result<()>;

    /// Answers a recheck button press with an alert.
    async fn answer_recheck_callback_query(&self, query_id: &str, allowed: bool) -> Result<()>;

    /// Clears the loading state of a pressed button.
    async fn answer_callback_query(&self, query_id: &str) -> Result<()>;

    /// Deletes a message.
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;
}

/// Telegram messaging service.
pub struct TelegramMessagingService {
    bot: Bot,
    owner_channel: String,
    required_text: String,
}

impl TelegramMessagingService {
    /// Creates the service. `required_text` replaces the default "please
    /// subscribe" text.
    pub fn new(bot: Bot, owner_channel: String, required_text: Option<String>) -> Self {
        let required_text =
            required_text.unwrap_or_else(|| texts::default_required_text(&owner_channel));
        Self { bot, owner_channel, required_text }
    }

    /// Sends an HTML message, optionally with an inline keyboard.
    async fn send_html(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId> {
        let request = self.bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
        let sent = match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(sent.id)
    }
}

#[async_trait]
impl MessagingService for TelegramMessagingService {
    async fn send_required_msg(&self, chat_id: ChatId) -> Result<()> {
        self.send_html(chat_id, self.required_text.clone(), None).await.map(|_| ())
    }

    async fn send_requirements_msg(&self, notice: &RequirementNotice) -> Result<MessageId> {
        let keyboard = build_requirements_keyboard(notice);
        self.send_html(notice.chat_id, texts::requirements_text(notice), Some(keyboard)).await
    }

    async fn send_access_granted_msg(&self, chat_id: ChatId) -> Result<()> {
        self.send_html(chat_id, "✅ Access confirmed.".to_string(), None).await.map(|_| ())
    }

    async fn send_start_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = texts::start_text(&self.owner_channel);
        self.send_html(chat_id, text, Some(COMMAND_KEYBOARD.clone())).await.map(|_| ())
    }

    async fn send_help_msg(&self, chat_id: ChatId) -> Result<()> {
        let help_text = html::escape(&Command::descriptions().to_string());
        self.send_html(chat_id, help_text, Some(COMMAND_KEYBOARD.clone())).await.map(|_| ())
    }

    async fn send_use_in_group_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = "This command only works in a group where the bot is an administrator.";
        self.send_html(chat_id, text.to_string(), None).await.map(|_| ())
    }

    async fn send_set_channel_usage_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = "Usage: <code>/setchannel @your_channel</code>";
        self.send_html(chat_id, text.to_string(), None).await.map(|_| ())
    }

    async fn send_invalid_channel_msg(
        &self,
        chat_id: ChatId,
        error: ChannelHandleError,
    ) -> Result<()> {
        let text = format!(
            "❌ {}\nUsage: <code>/setchannel @your_channel</code>",
            html::escape(&error.to_string())
        );
        self.send_html(chat_id, text, None).await.map(|_| ())
    }

    async fn send_channel_set_msg(
        &self,
        chat_id: ChatId,
        channel: &ChannelHandle,
        reachable: bool,
    ) -> Result<()> {
        let text = texts::channel_set_text(&self.owner_channel, channel, reachable);
        self.send_html(chat_id, text, None).await.map(|_| ())
    }

    async fn send_channel_disabled_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = texts::channel_disabled_text(&self.owner_channel);
        self.send_html(chat_id, text, None).await.map(|_| ())
    }

    async fn send_status_msg(
        &self,
        chat_id: ChatId,
        customer_channel: Option<ChannelHandle>,
    ) -> Result<()> {
        let text = texts::status_text(&self.owner_channel, customer_channel.as_ref());
        self.send_html(chat_id, text, None).await.map(|_| ())
    }

    async fn send_no_groups_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = "You have not connected the bot to any groups yet.";
        self.send_html(chat_id, text.to_string(), Some(COMMAND_KEYBOARD.clone())).await.map(|_| ())
    }

    async fn send_my_groups_msg(&self, chat_id: ChatId, groups: Vec<GroupConfig>) -> Result<()> {
        let text = texts::my_groups_text(&groups);
        self.send_html(chat_id, text, None).await.map(|_| ())
    }

    async fn send_error_msg(&self, chat_id: ChatId) -> Result<()> {
        let text = "⚠️ Something went wrong. Please try again later.";
        self.send_html(chat_id, text.to_string(), None).await.map(|_| ())
    }

    async fn answer_recheck_callback_query(&self, query_id: &str, allowed: bool) -> Result<()> {
        self.bot
            .answer_callback_query(query_id)
            .text(texts::recheck_answer_text(allowed))
            .show_alert(true)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn answer_callback_query(&self, query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(query_id)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot
            .delete_message(chat_id, message_id)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }
}
