use teloxide::types::{ChatId, UserId};

use crate::bot_handler::{BotHandler, BotHandlerResult};

/// Lists the groups the user registered, most recently active first. Also
/// reachable from the keyboard button, hence no `CommandContext`.
pub async fn handle(handler: &BotHandler, chat_id: ChatId, user_id: UserId) -> BotHandlerResult<()> {
    if !handler.gate.owner_satisfied(user_id).await {
        handler.messaging_service.send_required_msg(chat_id).await?;
        return Ok(());
    }

    let groups = handler.storage.list_groups_added_by(user_id, handler.my_groups_limit).await?;
    if groups.is_empty() {
        handler.messaging_service.send_no_groups_msg(chat_id).await?;
    } else {
        handler.messaging_service.send_my_groups_msg(chat_id, groups).await?;
    }
    Ok(())
}
