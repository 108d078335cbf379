use lazy_static::lazy_static;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use super::utils;
use crate::{bot_handler::CallbackAction, channel::ChannelHandle, gate::RequirementNotice};

/// Links to every required channel plus a button to re-run the check.
pub fn build_requirements_keyboard(notice: &RequirementNotice) -> InlineKeyboardMarkup {
    // The owner channel may be configured as a numeric id, which has no link.
    let owner = ChannelHandle::parse(&notice.owner_channel).ok();

    let mut buttons: Vec<Vec<InlineKeyboardButton>> = owner
        .iter()
        .chain(notice.customer_channel.iter())
        .filter_map(|channel| {
            Url::parse(&channel.url())
                .ok()
                .map(|url| vec![InlineKeyboardButton::url(format!("📢 {channel}"), url)])
        })
        .collect();

    let recheck = utils::serialize_action(&CallbackAction::Recheck(notice.chat_id.0));
    buttons.push(vec![InlineKeyboardButton::callback("🔄 I've subscribed", recheck)]);

    InlineKeyboardMarkup::new(buttons)
}

lazy_static! {
    pub static ref COMMAND_KEYBOARD: InlineKeyboardMarkup = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "📜 My groups",
            utils::serialize_action(&CallbackAction::MyGroups)
        )],
        vec![InlineKeyboardButton::callback(
            "ℹ️ Help",
            utils::serialize_action(&CallbackAction::Help)
        )],
    ]);
}
