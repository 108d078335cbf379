use crate::bot_handler::{BotHandlerResult, commands::CommandContext};

pub async fn handle(ctx: CommandContext<'_>) -> BotHandlerResult<()> {
    let chat_id = ctx.message.chat_id;
    if ctx.handler.gate.owner_satisfied(ctx.sender.id).await {
        ctx.handler.messaging_service.send_start_msg(chat_id).await?;
    } else {
        ctx.handler.messaging_service.send_required_msg(chat_id).await?;
    }
    Ok(())
}
