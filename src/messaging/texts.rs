use teloxide::utils::html;

use crate::{channel::ChannelHandle, gate::RequirementNotice, storage::GroupConfig};

/// The "please subscribe to the owner channel" text.
pub fn default_required_text(owner_channel: &str) -> String {
    format!(
        "❗️ To use this bot you need to be subscribed to the channel:\n{}\n\nSubscribe and press \
         /start again.",
        html::escape(owner_channel)
    )
}

/// The warning shown in a group to a user who is missing a subscription.
pub fn requirements_text(notice: &RequirementNotice) -> String {
    let owner = html::escape(&notice.owner_channel);
    match &notice.customer_channel {
        Some(customer) => format!(
            "❗️ To write in this chat you need to be subscribed to the channels:\n1) {owner}\n2) \
             {customer}\n\nSubscribe and press /check."
        ),
        None => format!(
            "❗️ To write in this chat you need to be subscribed to the channel:\n{owner}\n\n\
             Subscribe and press /check."
        ),
    }
}

/// Onboarding instructions for subscribed users.
pub fn start_text(owner_channel: &str) -> String {
    format!(
        "✅ Access confirmed.\n\n<b>How to connect the bot to your group:</b>\n1) Add the bot to \
         your group.\n2) Make it an administrator (at least: <i>delete messages</i>).\n3) In the \
         group, send:\n<code>/setchannel @your_channel</code> to also require your own \
         channel\nor <code>/disablechannel</code> to drop that requirement.\n\n<b>Note:</b> \
         subscription to {} is always required.",
        html::escape(owner_channel)
    )
}

/// Reply to `/setchannel`.
pub fn channel_set_text(owner_channel: &str, channel: &ChannelHandle, reachable: bool) -> String {
    if reachable {
        format!(
            "✅ Done.\nMembers of this chat now need to be subscribed to:\n1) {}\n2) {channel}\n\n\
             Checks run automatically on every message and on /check.",
            html::escape(owner_channel)
        )
    } else {
        format!(
            "✅ Setting saved, but I could not access your channel.\n\nFor subscription checks to \
             work, add this bot to the channel (preferably as an administrator) and run \
             /setchannel again.\n\nCurrent channel: {channel}"
        )
    }
}

/// Reply to `/disablechannel`.
pub fn channel_disabled_text(owner_channel: &str) -> String {
    format!(
        "✅ Done.\nThis chat now only requires a subscription to the owner channel: {}",
        html::escape(owner_channel)
    )
}

/// Reply to `/status`.
pub fn status_text(owner_channel: &str, customer_channel: Option<&ChannelHandle>) -> String {
    let owner = html::escape(owner_channel);
    match customer_channel {
        Some(customer) => format!(
            "📌 <b>Subscription check status</b>\nOwner channel: {owner}\nGroup channel: \
             {customer}\nMode: both channels required"
        ),
        None => format!(
            "📌 <b>Subscription check status</b>\nOwner channel: {owner}\nGroup channel: —\nMode: \
             owner channel only"
        ),
    }
}

/// Reply to `/mygroups`.
pub fn my_groups_text(groups: &[GroupConfig]) -> String {
    let mut lines = vec!["<b>Your groups:</b>".to_string()];
    lines.extend(groups.iter().map(|group| {
        let channel =
            group.customer_channel.as_ref().map(ChannelHandle::as_str).unwrap_or("—");
        let check = if group.required_customer_channel().is_some() {
            "required"
        } else {
            "not required"
        };
        format!(
            "• <b>{}</b> (<code>{}</code>)\n  channel: {channel} | check: {check}",
            html::escape(&group.title),
            group.group_id
        )
    }));
    lines.join("\n")
}

/// Alert shown after pressing the recheck button.
pub fn recheck_answer_text(allowed: bool) -> &'static str {
    if allowed {
        "✅ All good now!"
    } else {
        "You are not subscribed to all required channels yet."
    }
}
