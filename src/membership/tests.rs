use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::Duration;
use teloxide::{
    ApiError, RequestError,
    types::{Recipient, UserId},
};

use super::*;
use crate::{
    clock::ManualClock,
    platform::{MemberStatus, MockPlatformClient, PlatformError},
};

const CHANNEL: &str = "@owner_channel";
const USER: UserId = UserId(7);

fn cache_with(platform: MockPlatformClient) -> (MembershipCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = MembershipCache::new(Arc::new(platform), clock.clone(), Duration::seconds(60));
    (cache, clock)
}

// Platform whose answer flips from Member to Left after the first call.
fn flipping_platform(calls: Arc<AtomicUsize>) -> MockPlatformClient {
    let mut platform = MockPlatformClient::new();
    platform.expect_get_member_status().returning(move |_, _| {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(MemberStatus::Member),
            _ => Ok(MemberStatus::Left),
        }
    });
    platform
}

#[tokio::test]
async fn test_member_statuses_map_to_true() {
    for status in [MemberStatus::Member, MemberStatus::Administrator, MemberStatus::Creator] {
        let mut platform = MockPlatformClient::new();
        platform
            .expect_get_member_status()
            .withf(|chat, user| {
                *chat == Recipient::ChannelUsername(CHANNEL.to_string()) && *user == USER
            })
            .times(1)
            .returning(move |_, _| Ok(status));
        let (cache, _) = cache_with(platform);

        assert!(cache.check_membership(CHANNEL, USER).await, "status: {status:?}");
    }
}

#[tokio::test]
async fn test_non_member_statuses_map_to_false() {
    for status in [MemberStatus::Left, MemberStatus::Kicked, MemberStatus::Restricted] {
        let mut platform = MockPlatformClient::new();
        platform.expect_get_member_status().times(1).returning(move |_, _| Ok(status));
        let (cache, _) = cache_with(platform);

        assert!(!cache.check_membership(CHANNEL, USER).await, "status: {status:?}");
    }
}

#[tokio::test]
async fn test_cached_result_is_reused_within_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (cache, clock) = cache_with(flipping_platform(calls.clone()));

    assert!(cache.check_membership(CHANNEL, USER).await);

    // The platform would now say "left", but the cached answer still stands.
    clock.advance(Duration::seconds(59));
    assert!(cache.check_membership(CHANNEL, USER).await);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_changed_status_is_seen_after_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (cache, clock) = cache_with(flipping_platform(calls.clone()));

    assert!(cache.check_membership(CHANNEL, USER).await);

    clock.advance(Duration::seconds(60));
    assert!(!cache.check_membership(CHANNEL, USER).await);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_lookup_error_fails_closed_and_is_cached() {
    let mut platform = MockPlatformClient::new();
    platform.expect_get_member_status().times(1).returning(|_, _| {
        Err(PlatformError::TeloxideRequest(RequestError::Api(ApiError::ChatNotFound)))
    });
    let (cache, clock) = cache_with(platform);

    assert!(!cache.check_membership(CHANNEL, USER).await);

    clock.advance(Duration::seconds(30));
    assert!(!cache.check_membership(CHANNEL, USER).await);
}

#[tokio::test]
async fn test_blank_channel_is_never_looked_up() {
    let mut platform = MockPlatformClient::new();
    platform.expect_get_member_status().never();
    let (cache, _) = cache_with(platform);

    assert!(!cache.check_membership("", USER).await);
    assert!(!cache.check_membership("   ", USER).await);
    assert!(cache.entries.lock().await.is_empty());
}

#[tokio::test]
async fn test_entries_are_keyed_by_channel_and_user() {
    let mut platform = MockPlatformClient::new();
    platform.expect_get_member_status().times(3).returning(|chat, user| {
        match (chat, user) {
            (Recipient::ChannelUsername(name), UserId(7)) if name == CHANNEL => {
                Ok(MemberStatus::Member)
            }
            _ => Ok(MemberStatus::Left),
        }
    });
    let (cache, _) = cache_with(platform);

    assert!(cache.check_membership(CHANNEL, USER).await);
    assert!(!cache.check_membership("@shop", USER).await);
    assert!(!cache.check_membership(CHANNEL, UserId(8)).await);
    // Served from cache.
    assert!(cache.check_membership(CHANNEL, USER).await);
}
