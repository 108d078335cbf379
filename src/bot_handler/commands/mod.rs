pub mod check;
pub mod disable_channel;
pub mod help;
pub mod my_groups;
pub mod set_channel;
pub mod start;
pub mod status;

use crate::{
    bot_handler::{BotHandler, BotHandlerResult},
    platform::{InboundMessage, Sender},
};

/// CommandContext groups the data needed by all command handlers.
pub struct CommandContext<'a> {
    pub handler: &'a BotHandler,
    pub message: &'a InboundMessage,
    pub sender: Sender,
}

/// Lets a group command through only for administrators that are subscribed
/// to the owner channel. Non-subscribers get the owner channel text, subject
/// to the warning cooldown. Non-admins are ignored.
pub async fn authorize_admin(ctx: &CommandContext<'_>) -> BotHandlerResult<bool> {
    let chat_id = ctx.message.chat_id;
    let user_id = ctx.sender.id;

    if !ctx.handler.gate.owner_satisfied(user_id).await {
        if ctx.handler.cooldown.try_acquire(chat_id, user_id).await {
            ctx.handler.messaging_service.send_required_msg(chat_id).await?;
        }
        return Ok(false);
    }

    if !ctx.handler.is_chat_admin(chat_id, user_id).await {
        tracing::debug!("Ignoring admin command from {user_id} in {chat_id}");
        return Ok(false);
    }

    Ok(true)
}
