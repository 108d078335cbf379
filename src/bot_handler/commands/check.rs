use crate::bot_handler::{BotHandlerResult, commands::CommandContext};

/// Tells the sender whether they may write in the group. Does not touch the
/// warning cooldown; denials are answered at most once per check window.
pub async fn handle(ctx: CommandContext<'_>) -> BotHandlerResult<()> {
    let handler = ctx.handler;
    let chat_id = ctx.message.chat_id;

    let config = handler.enforcer.load_config(chat_id).await;
    let decision = handler.gate.evaluate(config.as_ref(), ctx.sender.id).await;

    if decision.allowed() {
        handler.messaging_service.send_access_granted_msg(chat_id).await?;
    } else if handler.check_cooldown.try_acquire(chat_id, ctx.sender.id).await {
        let notice = handler.gate.notice(chat_id, config.as_ref());
        handler.messaging_service.send_requirements_msg(&notice).await?;
    } else {
        tracing::debug!("Not repeating /check denial for {} in {chat_id}", ctx.sender.id);
    }
    Ok(())
}
