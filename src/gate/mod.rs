
use std::sync::Arc;

use teloxide::types::{ChatId, UserId};

use crate::{channel::ChannelHandle, membership::MembershipCache, storage::GroupConfig};

/// Which requirements a user satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// Subscribed to the owner channel.
    pub owner: bool,
    /// Subscribed to the group's channel, or the group requires none.
    pub customer: bool,
}

impl GateDecision {
    /// Both requirements hold.
    pub fn allowed(&self) -> bool {
        self.owner && self.customer
    }
}

/// The channels a chat requires, used to tell a user what to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementNotice {
    /// The group the notice is sent to.
    pub chat_id: ChatId,
    /// Owner channel as configured.
    pub owner_channel: String,
    /// The group's channel, if it is required.
    pub customer_channel: Option<ChannelHandle>,
}

/// Decides whether a user may write in a group.
///
/// The owner channel is required everywhere. A group's secondary channel is
/// an extra requirement on top of it, only when the group marks it required.
pub struct SubscriptionGate {
    membership: Arc<MembershipCache>,
    owner_channel: String,
    exempt_user: Option<UserId>,
}

impl SubscriptionGate {
    /// Creates a gate. `exempt_user` passes every check without lookups.
    pub fn new(
        membership: Arc<MembershipCache>,
        owner_channel: String,
        exempt_user: Option<UserId>,
    ) -> Self {
        Self { membership, owner_channel, exempt_user }
    }

    fn is_exempt(&self, user_id: UserId) -> bool {
        self.exempt_user == Some(user_id)
    }

    /// Evaluates both requirements for a user in a group. `None` means the
    /// group has no stored configuration.
    pub async fn evaluate(&self, config: Option<&GroupConfig>, user_id: UserId) -> GateDecision {
        if self.is_exempt(user_id) {
            return GateDecision { owner: true, customer: true };
        }

        let owner = self.membership.check_membership(&self.owner_channel, user_id).await;
        let customer = match config.and_then(GroupConfig::required_customer_channel) {
            Some(channel) => self.membership.check_membership(channel.as_str(), user_id).await,
            None => true,
        };

        GateDecision { owner, customer }
    }

    /// Whether the user satisfies the owner channel requirement alone.
    pub async fn owner_satisfied(&self, user_id: UserId) -> bool {
        self.is_exempt(user_id)
            || self.membership.check_membership(&self.owner_channel, user_id).await
    }

    /// Builds the notice listing every channel the chat requires.
    pub fn notice(&self, chat_id: ChatId, config: Option<&GroupConfig>) -> RequirementNotice {
        RequirementNotice {
            chat_id,
            owner_channel: self.owner_channel.clone(),
            customer_channel: config.and_then(GroupConfig::required_customer_channel).cloned(),
        }
    }
}
