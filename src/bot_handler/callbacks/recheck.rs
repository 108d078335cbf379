use teloxide::types::{ChatId, UserId};

use crate::bot_handler::{BotHandler, BotHandlerResult};

/// Re-evaluates the gate for the user who pressed the button and answers
/// with an alert. Never counts as a warning.
pub async fn handle(
    handler: &BotHandler,
    query_id: &str,
    user_id: UserId,
    chat_id: ChatId,
) -> BotHandlerResult<()> {
    let config = handler.enforcer.load_config(chat_id).await;
    let decision = handler.gate.evaluate(config.as_ref(), user_id).await;
    tracing::debug!("Recheck by {user_id} in {chat_id}: {decision:?}");

    handler.messaging_service.answer_recheck_callback_query(query_id, decision.allowed()).await?;
    Ok(())
}
