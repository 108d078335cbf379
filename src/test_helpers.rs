use std::{collections::HashSet, sync::Arc};

use chrono::Duration;
use teloxide::types::{ChatId, MessageId, Recipient, UserId};

use crate::{
    bot_handler::BotHandler,
    clock::ManualClock,
    cooldown::WarnCooldown,
    enforcement::Enforcer,
    gate::SubscriptionGate,
    membership::MembershipCache,
    messaging::MockMessagingService,
    platform::{ChatScope, InboundMessage, MemberStatus, MockPlatformClient, Sender},
    storage::{GroupStorage, sqlite::SqliteStorage},
};

pub const OWNER_CHANNEL: &str = "@owner_channel";
pub const GROUP: ChatId = ChatId(-1001);
pub const USER: UserId = UserId(7);
pub const ADMIN: UserId = UserId(42);

/// A platform where `subscriptions` lists (channel, user) memberships and
/// `admins` lists the administrators of every group. Everyone else has left.
pub fn mock_platform(subscriptions: &[(&str, UserId)], admins: &[UserId]) -> MockPlatformClient {
    let subscriptions: HashSet<(String, UserId)> =
        subscriptions.iter().map(|(channel, user)| (channel.to_string(), *user)).collect();
    let admins: HashSet<UserId> = admins.iter().copied().collect();

    let mut platform = MockPlatformClient::new();
    platform.expect_get_member_status().returning(move |chat, user_id| match chat {
        Recipient::ChannelUsername(name) if subscriptions.contains(&(name.clone(), user_id)) => {
            Ok(MemberStatus::Member)
        }
        Recipient::Id(_) if admins.contains(&user_id) => Ok(MemberStatus::Administrator),
        Recipient::Id(_) => Ok(MemberStatus::Member),
        _ => Ok(MemberStatus::Left),
    });
    platform
}

pub fn group_message(user: UserId, message_id: i32, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id: GROUP,
        scope: ChatScope::Group,
        chat_title: Some("Sales chat".to_string()),
        message_id: MessageId(message_id),
        sender: Some(Sender { id: user, is_bot: false }),
        text: Some(text.to_string()),
    }
}

pub fn private_message(user: UserId, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(user.0 as i64),
        scope: ChatScope::Private,
        chat_title: None,
        message_id: MessageId(1),
        sender: Some(Sender { id: user, is_bot: false }),
        text: Some(text.to_string()),
    }
}

/// Every component wired the way `run` wires them, over mocks and an
/// in-memory database.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub storage: Arc<dyn GroupStorage>,
    pub gate: Arc<SubscriptionGate>,
    pub cooldown: Arc<WarnCooldown>,
    pub enforcer: Arc<Enforcer>,
    pub handler: BotHandler,
}

impl Harness {
    pub async fn new(platform: MockPlatformClient, messaging: MockMessagingService) -> Self {
        Self::with(platform, messaging, None, None).await
    }

    pub async fn with(
        platform: MockPlatformClient,
        messaging: MockMessagingService,
        storage: Option<Arc<dyn GroupStorage>>,
        exempt: Option<UserId>,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let storage: Arc<dyn GroupStorage> = match storage {
            Some(storage) => storage,
            None => Arc::new(SqliteStorage::new("sqlite::memory:", clock.clone()).await.unwrap()),
        };
        let platform = Arc::new(platform);
        let messaging = Arc::new(messaging);

        let membership =
            Arc::new(MembershipCache::new(platform.clone(), clock.clone(), Duration::seconds(60)));
        let gate = Arc::new(SubscriptionGate::new(membership, OWNER_CHANNEL.to_string(), exempt));
        let cooldown = Arc::new(WarnCooldown::new(clock.clone(), Duration::seconds(60)));
        let enforcer = Arc::new(Enforcer::new(
            storage.clone(),
            gate.clone(),
            cooldown.clone(),
            messaging.clone(),
            None,
        ));
        let handler = BotHandler::new(
            messaging,
            platform,
            storage.clone(),
            gate.clone(),
            cooldown.clone(),
            Arc::new(WarnCooldown::new(clock.clone(), Duration::seconds(60))),
            enforcer.clone(),
            30,
        );

        Self { clock, storage, gate, cooldown, enforcer, handler }
    }
}
