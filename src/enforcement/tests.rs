use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::Duration;
use mockall::predicate::*;
use teloxide::{
    ApiError, RequestError,
    types::{ChatId, MessageId, UserId},
};

use super::{Enforcement, Enforcer};
use crate::{
    channel::ChannelHandle,
    messaging::{MessagingError, MockMessagingService},
    platform::{ChatScope, Sender},
    storage::{MockGroupStorage, StorageError},
    test_helpers::{ADMIN, GROUP, Harness, OWNER_CHANNEL, USER, group_message, mock_platform},
};

fn api_error(error: ApiError) -> MessagingError {
    MessagingError::TeloxideRequest(RequestError::Api(error))
}

#[tokio::test]
async fn test_unsubscribed_user_is_warned_once_per_window() {
    let mut messaging = MockMessagingService::new();
    messaging.expect_delete_message().times(3).returning(|_, _| Ok(()));
    messaging
        .expect_send_requirements_msg()
        .withf(|notice| {
            notice.chat_id == GROUP
                && notice.owner_channel == OWNER_CHANNEL
                && notice.customer_channel.is_none()
        })
        .times(2)
        .returning(|_| Ok(MessageId(900)));

    let harness = Harness::new(mock_platform(&[], &[]), messaging).await;
    let enforcer = &harness.enforcer;

    let first = enforcer.enforce(&group_message(USER, 1, "hello")).await;
    assert_eq!(first, Enforcement::Denied { deleted: true, warned: true });

    harness.clock.advance(Duration::seconds(5));
    let second = enforcer.enforce(&group_message(USER, 2, "hello?")).await;
    assert_eq!(second, Enforcement::Denied { deleted: true, warned: false });

    harness.clock.advance(Duration::seconds(60));
    let third = enforcer.enforce(&group_message(USER, 3, "anyone?")).await;
    assert_eq!(third, Enforcement::Denied { deleted: true, warned: true });
}

#[tokio::test]
async fn test_notice_lists_both_channels_when_customer_channel_missing() {
    let mut messaging = MockMessagingService::new();
    messaging
        .expect_delete_message()
        .withf(|chat_id, message_id| *chat_id == GROUP && *message_id == MessageId(5))
        .times(1)
        .returning(|_, _| Ok(()));
    messaging
        .expect_send_requirements_msg()
        .withf(|notice| {
            notice.owner_channel == OWNER_CHANNEL
                && notice.customer_channel.as_ref().map(ChannelHandle::as_str) == Some("@shop")
        })
        .times(1)
        .returning(|_| Ok(MessageId(900)));

    let platform = mock_platform(&[(OWNER_CHANNEL, USER)], &[]);
    let harness = Harness::new(platform, messaging).await;
    harness.storage.upsert_group(GROUP, "Sales chat", ADMIN).await.unwrap();
    harness
        .storage
        .set_customer_channel(GROUP, Some(ChannelHandle::parse("@shop").unwrap()))
        .await
        .unwrap();

    let outcome = harness.enforcer.enforce(&group_message(USER, 5, "hi")).await;

    assert_eq!(outcome, Enforcement::Denied { deleted: true, warned: true });
}

#[tokio::test]
async fn test_subscribed_user_is_allowed_and_group_registered() {
    let platform = mock_platform(&[(OWNER_CHANNEL, USER)], &[]);
    let harness = Harness::new(platform, MockMessagingService::new()).await;

    let outcome = harness.enforcer.enforce(&group_message(USER, 1, "hi")).await;

    assert_eq!(outcome, Enforcement::Allowed);
    let group = harness.storage.get_group(GROUP).await.unwrap().unwrap();
    assert_eq!(group.title, "Sales chat");
    assert_eq!(group.added_by, USER);
}

#[tokio::test]
async fn test_bots_and_anonymous_messages_are_ignored() {
    let mut storage = MockGroupStorage::new();
    storage.expect_upsert_group().never();
    storage.expect_get_group().never();

    let harness = Harness::with(
        mock_platform(&[], &[]),
        MockMessagingService::new(),
        Some(Arc::new(storage)),
        None,
    )
    .await;

    let mut from_bot = group_message(USER, 1, "beep");
    from_bot.sender = Some(Sender { id: UserId(99), is_bot: true });
    let mut anonymous = group_message(USER, 2, "hidden");
    anonymous.sender = None;
    let mut private = group_message(USER, 3, "hi");
    private.scope = ChatScope::Private;
    private.chat_id = ChatId(7);

    for msg in [from_bot, anonymous, private] {
        assert_eq!(harness.enforcer.enforce(&msg).await, Enforcement::Ignored);
    }
}

#[tokio::test]
async fn test_storage_failures_fall_back_to_owner_channel_only() {
    let mut storage = MockGroupStorage::new();
    storage
        .expect_upsert_group()
        .returning(|_, _, _| Err(StorageError::DbError(sqlx::Error::PoolClosed)));
    storage.expect_get_group().returning(|_| Err(StorageError::DbError(sqlx::Error::PoolClosed)));

    let mut messaging = MockMessagingService::new();
    messaging.expect_delete_message().times(1).returning(|_, _| Ok(()));
    messaging
        .expect_send_requirements_msg()
        .withf(|notice| notice.customer_channel.is_none())
        .times(1)
        .returning(|_| Ok(MessageId(900)));

    let harness =
        Harness::with(mock_platform(&[], &[]), messaging, Some(Arc::new(storage)), None).await;

    let outcome = harness.enforcer.enforce(&group_message(USER, 1, "hi")).await;

    assert_eq!(outcome, Enforcement::Denied { deleted: true, warned: true });
}

#[tokio::test]
async fn test_delete_failure_still_warns() {
    let mut messaging = MockMessagingService::new();
    messaging
        .expect_delete_message()
        .times(1)
        .returning(|_, _| Err(api_error(ApiError::MessageCantBeDeleted)));
    messaging.expect_send_requirements_msg().times(1).returning(|_| Ok(MessageId(900)));

    let harness = Harness::new(mock_platform(&[], &[]), messaging).await;

    let outcome = harness.enforcer.enforce(&group_message(USER, 1, "hi")).await;

    assert_eq!(outcome, Enforcement::Denied { deleted: false, warned: true });
}

#[tokio::test]
async fn test_send_failure_is_not_reported_as_warned() {
    let mut messaging = MockMessagingService::new();
    messaging.expect_delete_message().times(1).returning(|_, _| Ok(()));
    messaging
        .expect_send_requirements_msg()
        .times(1)
        .returning(|_| Err(api_error(ApiError::BotKicked)));

    let harness = Harness::new(mock_platform(&[], &[]), messaging).await;

    let outcome = harness.enforcer.enforce(&group_message(USER, 1, "hi")).await;

    assert_eq!(outcome, Enforcement::Denied { deleted: true, warned: false });
    // The failed send still used up the window.
    assert!(!harness.cooldown.try_acquire(GROUP, USER).await);
}

#[tokio::test]
async fn test_exempt_user_is_always_allowed() {
    let harness = Harness::with(
        mock_platform(&[], &[]),
        MockMessagingService::new(),
        None,
        Some(USER),
    )
    .await;

    let outcome = harness.enforcer.enforce(&group_message(USER, 1, "hi")).await;

    assert_eq!(outcome, Enforcement::Allowed);
}

#[tokio::test(start_paused = true)]
async fn test_warning_removes_itself_after_ttl() {
    let removed = Arc::new(AtomicUsize::new(0));
    let removed_in_mock = removed.clone();

    let mut messaging = MockMessagingService::new();
    messaging.expect_delete_message().with(eq(GROUP), eq(MessageId(1))).returning(|_, _| Ok(()));
    messaging.expect_send_requirements_msg().times(1).returning(|_| Ok(MessageId(900)));
    messaging.expect_delete_message().with(eq(GROUP), eq(MessageId(900))).returning(
        move |_, _| {
            removed_in_mock.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );

    // A mocked store keeps every step on the paused runtime.
    let mut storage = MockGroupStorage::new();
    storage.expect_upsert_group().returning(|_, _, _| Ok(()));
    storage.expect_get_group().returning(|_| Ok(None));

    let harness = Harness::with(
        mock_platform(&[], &[]),
        MockMessagingService::new(),
        Some(Arc::new(storage)),
        None,
    )
    .await;
    let enforcer = Enforcer::new(
        harness.storage.clone(),
        harness.gate.clone(),
        harness.cooldown.clone(),
        Arc::new(messaging),
        Some(std::time::Duration::from_secs(30)),
    );

    enforcer.enforce(&group_message(USER, 1, "hi")).await;
    // Let the removal task start its timer.
    tokio::task::yield_now().await;

    tokio::time::advance(std::time::Duration::from_secs(29)).await;
    tokio::task::yield_now().await;
    assert_eq!(removed.load(Ordering::SeqCst), 0);

    tokio::time::advance(std::time::Duration::from_secs(2)).await;
    for _ in 0..10 {
        if removed.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(removed.load(Ordering::SeqCst), 1);
}
