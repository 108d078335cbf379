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

    let customer_channel = handler
        .enforcer
        .load_config(chat_id)
        .await
        .and_then(|config| config.required_customer_channel().cloned());

    handler.messaging_service.send_status_msg(chat_id, customer_channel).await?;
    Ok(())
}
