#[cfg(test)]
mod tests;

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use teloxide::types::UserId;
use tokio::sync::Mutex;

use crate::{
    clock::Clock,
    platform::{PlatformClient, recipient_for},
};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    is_member: bool,
    expires_at: DateTime<Utc>,
}

/// Short-lived memoization of "is this user subscribed to this channel".
///
/// Lookup failures count as "not subscribed" and are cached like any other
/// answer. Entries are only replaced, never evicted, so the map grows with the
/// number of distinct (channel, user) pairs seen.
pub struct MembershipCache {
    platform: Arc<dyn PlatformClient>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<(String, UserId), CacheEntry>>,
}

impl MembershipCache {
    /// Creates an empty cache whose answers live for `ttl`.
    pub fn new(platform: Arc<dyn PlatformClient>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { platform, clock, ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Returns whether the user is a member, administrator or creator of the
    /// channel.
    pub async fn check_membership(&self, channel: &str, user_id: UserId) -> bool {
        let channel = channel.trim();
        if channel.is_empty() {
            return false;
        }

        let key = (channel.to_string(), user_id);
        let now = self.clock.now();

        if let Some(entry) = self.entries.lock().await.get(&key) {
            if entry.expires_at > now {
                return entry.is_member;
            }
        }

        let is_member = match self.platform.get_member_status(recipient_for(channel), user_id).await
        {
            Ok(status) => status.is_subscribed(),
            Err(e) => {
                tracing::warn!("Cannot check subscription: channel={channel} user={user_id}: {e}");
                false
            }
        };

        self.entries
            .lock()
            .await
            .insert(key, CacheEntry { is_member, expires_at: now + self.ttl });

        is_member
    }
}
