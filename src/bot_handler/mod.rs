mod callback_actions;
mod callbacks;
mod commands;

use std::sync::Arc;

pub use callback_actions::CallbackAction;
use teloxide::{
    types::{CallbackQuery, ChatId, Recipient, UserId},
    utils::command::{BotCommands, ParseError},
};
use thiserror::Error;

use crate::{
    bot_handler::commands::CommandContext,
    cooldown::WarnCooldown,
    enforcement::{Enforcement, Enforcer},
    gate::SubscriptionGate,
    messaging::{MessagingError, MessagingService},
    platform::{ChatScope, InboundMessage, PlatformClient},
    storage::{GroupStorage, StorageError},
};

#[allow(missing_docs)]
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Check your subscriptions and get setup instructions.")]
    Start,
    #[command(description = "Show this help text.")]
    Help,
    #[command(description = "Check whether you can write in this group.")]
    Check,
    #[command(
        description = "Require a second channel in this group, e.g. /setchannel @shop (admins).",
        parse_with = parse_channel_argument
    )]
    SetChannel(String),
    #[command(description = "Stop requiring the second channel (admins).")]
    DisableChannel,
    #[command(description = "Show the channels this group requires (admins).")]
    Status,
    #[command(description = "List the groups you connected.")]
    MyGroups,
}

/// Keeps the raw argument, empty or not, so `/setchannel` without one can be
/// answered with usage instead of being dropped by the parser.
fn parse_channel_argument(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

/// Errors raised by command and button handlers.
#[derive(Debug, Error)]
pub enum BotHandlerError {
    /// A reply could not be sent.
    #[error("Failed to send message: {0}")]
    Messaging(#[from] MessagingError),

    /// The configuration store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type of handlers.
pub type BotHandlerResult<T> = Result<T, BotHandlerError>;

/// Routes commands and button presses to their handlers.
pub struct BotHandler {
    messaging_service: Arc<dyn MessagingService>,
    platform: Arc<dyn PlatformClient>,
    storage: Arc<dyn GroupStorage>,
    gate: Arc<SubscriptionGate>,
    cooldown: Arc<WarnCooldown>,
    check_cooldown: Arc<WarnCooldown>,
    enforcer: Arc<Enforcer>,
    my_groups_limit: usize,
}

impl BotHandler {
    /// Creates a new `BotHandler` instance. `check_cooldown` limits how often
    /// a denied `/check` is answered and is separate from the warning one.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        messaging_service: Arc<dyn MessagingService>,
        platform: Arc<dyn PlatformClient>,
        storage: Arc<dyn GroupStorage>,
        gate: Arc<SubscriptionGate>,
        cooldown: Arc<WarnCooldown>,
        check_cooldown: Arc<WarnCooldown>,
        enforcer: Arc<Enforcer>,
        my_groups_limit: usize,
    ) -> Self {
        Self {
            messaging_service,
            platform,
            storage,
            gate,
            cooldown,
            check_cooldown,
            enforcer,
            my_groups_limit,
        }
    }

    /// Dispatches the incoming command to the appropriate handler. Errors are
    /// logged and never reach the dispatcher.
    pub async fn handle_commands(&self, msg: &InboundMessage, cmd: Command) {
        let Some(sender) = msg.human_sender() else {
            return;
        };
        let ctx = CommandContext { handler: self, message: msg, sender };

        let result = match (msg.scope, cmd) {
            (ChatScope::Private, Command::Start) => commands::start::handle(ctx).await,
            (ChatScope::Private, Command::Help) => commands::help::handle(ctx).await,
            (ChatScope::Private, Command::MyGroups) => {
                commands::my_groups::handle(self, msg.chat_id, sender.id).await
            }
            (ChatScope::Private, _) => {
                self.messaging_service.send_use_in_group_msg(msg.chat_id).await.map_err(Into::into)
            }
            (ChatScope::Group, Command::Check) => commands::check::handle(ctx).await,
            (ChatScope::Group, Command::SetChannel(argument)) => {
                commands::set_channel::handle(ctx, &argument).await
            }
            (ChatScope::Group, Command::DisableChannel) => {
                commands::disable_channel::handle(ctx).await
            }
            (ChatScope::Group, Command::Status) => commands::status::handle(ctx).await,
            // Private-only commands posted in a group are ordinary messages.
            (ChatScope::Group, _) => {
                self.handle_group_message(msg).await;
                Ok(())
            }
            (ChatScope::Other, _) => Ok(()),
        };

        if let Err(e) = result {
            self.report_failure(msg.chat_id, e).await;
        }
    }

    /// Runs a plain group message through enforcement.
    pub async fn handle_group_message(&self, msg: &InboundMessage) -> Enforcement {
        self.enforcer.enforce(msg).await
    }

    /// Handles an inline button press.
    pub async fn handle_callback_query(&self, query: &CallbackQuery) {
        let Some(action) = query.data.as_deref().and_then(CallbackAction::from_data) else {
            tracing::debug!("Ignoring callback query with unknown data: {:?}", query.data);
            return;
        };
        let origin_chat = query.message.as_ref().map(|m| m.chat().id);

        if let Err(e) = self.handle_callback(&query.id, query.from.id, origin_chat, action).await {
            match origin_chat {
                Some(chat_id) => self.report_failure(chat_id, e).await,
                None => tracing::error!("Failed to handle callback query: {e}"),
            }
        }
    }

    /// Handles a decoded button press.
    pub async fn handle_callback(
        &self,
        query_id: &str,
        user_id: UserId,
        origin_chat: Option<ChatId>,
        action: CallbackAction,
    ) -> BotHandlerResult<()> {
        match action {
            CallbackAction::Recheck(chat_id) => {
                callbacks::recheck::handle(self, query_id, user_id, ChatId(chat_id)).await
            }
            CallbackAction::MyGroups => {
                self.messaging_service.answer_callback_query(query_id).await?;
                match origin_chat {
                    Some(chat_id) => commands::my_groups::handle(self, chat_id, user_id).await,
                    None => Ok(()),
                }
            }
            CallbackAction::Help => {
                self.messaging_service.answer_callback_query(query_id).await?;
                match origin_chat {
                    Some(chat_id) => Ok(self.messaging_service.send_help_msg(chat_id).await?),
                    None => Ok(()),
                }
            }
        }
    }

    /// Whether the user administers the group. A failed lookup counts as no.
    async fn is_chat_admin(&self, chat_id: ChatId, user_id: UserId) -> bool {
        match self.platform.get_member_status(Recipient::Id(chat_id), user_id).await {
            Ok(status) => status.is_admin(),
            Err(e) => {
                tracing::warn!("Cannot check admin rights of {user_id} in {chat_id}: {e}");
                false
            }
        }
    }

    async fn report_failure(&self, chat_id: ChatId, error: BotHandlerError) {
        tracing::error!("Failed to handle update in chat {chat_id}: {error}");
        if let BotHandlerError::Storage(_) = error {
            if let Err(e) = self.messaging_service.send_error_msg(chat_id).await {
                tracing::warn!("Cannot report failure to chat {chat_id}: {e}");
            }
        }
    }
}
