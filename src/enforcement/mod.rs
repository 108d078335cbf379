#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Duration};

use teloxide::types::{ChatId, MessageId};

use crate::{
    cooldown::WarnCooldown,
    gate::SubscriptionGate,
    messaging::MessagingService,
    platform::{ChatScope, InboundMessage},
    storage::{GroupConfig, GroupStorage},
};

/// What happened to a group message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
    /// Not a group message from a human, nothing was done.
    Ignored,
    /// The sender passed the gate.
    Allowed,
    /// The sender failed the gate.
    Denied {
        /// The message was removed.
        deleted: bool,
        /// A warning was posted.
        warned: bool,
    },
}

/// Checks every group message against the gate and removes messages from
/// users who are missing a subscription.
///
/// Never fails: every external error is logged and the pass continues or
/// stops for that message only.
pub struct Enforcer {
    storage: Arc<dyn GroupStorage>,
    gate: Arc<SubscriptionGate>,
    cooldown: Arc<WarnCooldown>,
    messaging_service: Arc<dyn MessagingService>,
    // Delete our own warnings after this long.
    warn_ttl: Option<Duration>,
}

impl Enforcer {
    /// Creates an enforcer. With `warn_ttl` set, warnings delete themselves
    /// after that long.
    pub fn new(
        storage: Arc<dyn GroupStorage>,
        gate: Arc<SubscriptionGate>,
        cooldown: Arc<WarnCooldown>,
        messaging_service: Arc<dyn MessagingService>,
        warn_ttl: Option<Duration>,
    ) -> Self {
        Self { storage, gate, cooldown, messaging_service, warn_ttl }
    }

    /// Runs one group message through the gate, deleting and warning as
    /// needed.
    pub async fn enforce(&self, msg: &InboundMessage) -> Enforcement {
        let Some(sender) = msg.human_sender() else {
            return Enforcement::Ignored;
        };
        if msg.scope != ChatScope::Group {
            return Enforcement::Ignored;
        }
        let chat_id = msg.chat_id;

        if let Err(e) = self.storage.upsert_group(chat_id, &msg.display_title(), sender.id).await {
            tracing::warn!("Upsert group {chat_id} failed: {e}");
        }

        let config = self.load_config(chat_id).await;
        let decision = self.gate.evaluate(config.as_ref(), sender.id).await;
        if decision.allowed() {
            return Enforcement::Allowed;
        }

        tracing::debug!(
            "Denied message {:?} from {} in {chat_id}: {decision:?}",
            msg.message_id,
            sender.id
        );

        let deleted = match self.messaging_service.delete_message(chat_id, msg.message_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Cannot delete message in chat {chat_id}: {e}");
                false
            }
        };

        let mut warned = false;
        if self.cooldown.try_acquire(chat_id, sender.id).await {
            let notice = self.gate.notice(chat_id, config.as_ref());
            match self.messaging_service.send_requirements_msg(&notice).await {
                Ok(warning_id) => {
                    warned = true;
                    self.schedule_warning_removal(chat_id, warning_id);
                }
                Err(e) => tracing::warn!("Cannot send warning in chat {chat_id}: {e}"),
            }
        }

        Enforcement::Denied { deleted, warned }
    }

    /// Loads a group's configuration. A failed read counts as "no secondary
    /// channel configured".
    pub async fn load_config(&self, chat_id: ChatId) -> Option<GroupConfig> {
        match self.storage.get_group(chat_id).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config for group {chat_id}: {e}");
                None
            }
        }
    }

    fn schedule_warning_removal(&self, chat_id: ChatId, message_id: MessageId) {
        let Some(ttl) = self.warn_ttl else {
            return;
        };
        let messaging_service = self.messaging_service.clone();

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Err(e) = messaging_service.delete_message(chat_id, message_id).await {
                tracing::debug!("Cannot remove expired warning in chat {chat_id}: {e}");
            }
        });
    }
}
