use crate::{
    bot_handler::{
        BotHandlerResult,
        commands::{CommandContext, authorize_admin},
    },
    channel::ChannelHandle,
    platform::recipient_for,
};

pub async fn handle(ctx: CommandContext<'_>, argument: &str) -> BotHandlerResult<()> {
    if !authorize_admin(&ctx).await? {
        return Ok(());
    }
    let handler = ctx.handler;
    let chat_id = ctx.message.chat_id;

    if argument.trim().is_empty() {
        handler.messaging_service.send_set_channel_usage_msg(chat_id).await?;
        return Ok(());
    }

    let channel = match ChannelHandle::parse(argument) {
        Ok(channel) => channel,
        Err(e) => {
            handler.messaging_service.send_invalid_channel_msg(chat_id, e).await?;
            return Ok(());
        }
    };

    handler.storage.upsert_group(chat_id, &ctx.message.display_title(), ctx.sender.id).await?;

    // Saved either way; an unreachable channel only changes the reply.
    let reachable = match handler.platform.probe_chat(recipient_for(channel.as_str())).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Channel {channel} is not reachable: {e}");
            false
        }
    };

    handler.storage.set_customer_channel(chat_id, Some(channel.clone())).await?;
    tracing::info!("Group {chat_id} now requires {channel}");

    handler.messaging_service.send_channel_set_msg(chat_id, &channel, reachable).await?;
    Ok(())
}
