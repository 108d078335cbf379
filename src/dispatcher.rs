use std::sync::Arc;

use teloxide::{
    dispatching::{DefaultKey, UpdateHandler},
    dptree::deps,
    prelude::*,
    types::Update,
};

use crate::{
    bot_handler::{BotHandler, Command},
    platform::InboundMessage,
};

/// Type alias to simplify handler type signatures.
type BotResultHandler = UpdateHandler<anyhow::Error>;

/// Encapsulates the dispatcher logic for the bot.
pub struct BotDispatcher {
    handler: Arc<BotHandler>,
}

impl BotDispatcher {
    /// Creates a new `BotDispatcher`.
    pub fn new(handler: Arc<BotHandler>) -> Self {
        Self { handler }
    }

    /// Builds the dispatcher using the provided `bot` instance. Updates of
    /// one chat are handled in order, different chats concurrently.
    #[must_use = "This function returns a Dispatcher that should not be ignored"]
    pub fn build(&self, bot: Bot) -> Dispatcher<Bot, anyhow::Error, DefaultKey> {
        Dispatcher::builder(
            bot,
            dptree::entry()
                .branch(self.build_commands_branch())
                .branch(self.build_callback_queries_branch())
                .branch(self.build_group_messages_branch()),
        )
        .dependencies(deps![self.handler.clone()])
        .default_handler(|update| async move {
            tracing::trace!("Unhandled update: {:?}", update.kind);
        })
        .enable_ctrlc_handler()
        .build()
    }

    /// Builds the branch for handling text commands addressed to this bot.
    fn build_commands_branch(&self) -> BotResultHandler {
        Update::filter_message().filter_command::<Command>().endpoint(
            |msg: Message, cmd: Command, handler: Arc<BotHandler>| async move {
                handler.handle_commands(&InboundMessage::from(&msg), cmd).await;
                Ok(())
            },
        )
    }

    /// Builds the branch for inline button presses.
    fn build_callback_queries_branch(&self) -> BotResultHandler {
        Update::filter_callback_query().endpoint(
            |query: CallbackQuery, handler: Arc<BotHandler>| async move {
                handler.handle_callback_query(&query).await;
                Ok(())
            },
        )
    }

    /// Builds the branch that enforces subscriptions on every other group
    /// message, including commands meant for other bots.
    fn build_group_messages_branch(&self) -> BotResultHandler {
        Update::filter_message()
            .filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
            .endpoint(|msg: Message, handler: Arc<BotHandler>| async move {
                let outcome = handler.handle_group_message(&InboundMessage::from(&msg)).await;
                tracing::trace!("Message {:?} in {}: {outcome:?}", msg.id, msg.chat.id);
                Ok(())
            })
    }
}
