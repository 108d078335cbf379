use crate::bot_handler::{
    BotHandlerResult,
    commands::{CommandContext, authorize_admin},
};

pub async fn handle(ctx: CommandContext<'_>) -> BotHandlerResult<()> {
    if !authorize_admin(&ctx).await? {
        return Ok(());
    }
    let handler = ctx.handler;
    let chat_id = ctx.message.chat_id;

    handler.storage.upsert_group(chat_id, &ctx.message.display_title(), ctx.sender.id).await?;
    handler.storage.set_customer_channel(chat_id, None).await?;
    tracing::info!("Group {chat_id} no longer requires a second channel");

    handler.messaging_service.send_channel_disabled_msg(chat_id).await?;
    Ok(())
}
