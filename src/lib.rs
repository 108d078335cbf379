#![warn(missing_docs)]
//! A Telegram bot that keeps group chats open only to subscribers.
//!
//! Every message in a connected group is checked against the bot owner's
//! channel and, optionally, a second channel chosen by the group's admins.
//! Messages from non-subscribers are deleted and the author is told which
//! channels to join.

/// The main handler for the bot's commands and buttons.
pub mod bot_handler;
/// Public channel references.
pub mod channel;
/// Injectable time source.
pub mod clock;
/// The configuration for the application.
pub mod config;
/// Per-user warning rate limiting.
pub mod cooldown;
/// The dispatcher for routing updates to the correct handlers.
pub mod dispatcher;
/// Deletion of messages from non-subscribers.
pub mod enforcement;
/// Composition of the subscription requirements.
pub mod gate;
/// Cached channel membership lookups.
pub mod membership;
/// The service for sending messages to the user.
pub mod messaging;
/// Read-only queries against Telegram.
pub mod platform;
/// The storage layer for persisting group configuration.
pub mod storage;
#[cfg(test)]
mod test_helpers;

use std::{sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use teloxide::{prelude::*, types::UserId, utils::command::BotCommands};

use crate::{
    bot_handler::{BotHandler, Command},
    clock::{Clock, SystemClock},
    config::Config,
    cooldown::WarnCooldown,
    enforcement::Enforcer,
    gate::SubscriptionGate,
    membership::MembershipCache,
    messaging::TelegramMessagingService,
    platform::TelegramPlatformClient,
    storage::sqlite::SqliteStorage,
};

/// Runs the bot.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage = Arc::new(SqliteStorage::new(&config.database_url, clock.clone()).await?);
    let bot = Bot::new(config.telegram_bot_token.clone());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {e}");
    }

    let platform = Arc::new(TelegramPlatformClient::new(bot.clone()));
    let messaging_service = Arc::new(TelegramMessagingService::new(
        bot.clone(),
        config.owner_channel.clone(),
        config.required_message_text.clone(),
    ));

    let membership = Arc::new(MembershipCache::new(
        platform.clone(),
        clock.clone(),
        Duration::seconds(config.check_ttl_seconds as i64),
    ));
    let gate = Arc::new(SubscriptionGate::new(
        membership,
        config.owner_channel.clone(),
        config.owner_id.map(UserId),
    ));
    let cooldown = Arc::new(WarnCooldown::new(
        clock.clone(),
        Duration::seconds(config.warn_cooldown_seconds as i64),
    ));
    let check_cooldown = Arc::new(WarnCooldown::new(
        clock.clone(),
        Duration::seconds(config.warn_cooldown_seconds as i64),
    ));
    let warn_ttl = match config.warn_delete_after_seconds {
        0 => None,
        seconds => Some(StdDuration::from_secs(seconds)),
    };
    let enforcer = Arc::new(Enforcer::new(
        storage.clone(),
        gate.clone(),
        cooldown.clone(),
        messaging_service.clone(),
        warn_ttl,
    ));

    let handler = Arc::new(BotHandler::new(
        messaging_service,
        platform,
        storage,
        gate,
        cooldown,
        check_cooldown,
        enforcer,
        config.my_groups_limit,
    ));
    tracing::info!("Gating groups behind {}", config.owner_channel);

    let mut dispatcher = dispatcher::BotDispatcher::new(handler).build(bot);
    tracing::debug!("Dispatcher built successfully.");

    dispatcher.dispatch().await;

    Ok(())
}
