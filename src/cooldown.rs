use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use teloxide::types::{ChatId, UserId};
use tokio::sync::Mutex;

use crate::clock::Clock;

/// Limits warnings to one per window for each (chat, user) pair.
pub struct WarnCooldown {
    clock: Arc<dyn Clock>,
    window: Duration,
    last_warned: Mutex<HashMap<(ChatId, UserId), DateTime<Utc>>>,
}

impl WarnCooldown {
    /// Creates a tracker allowing one warning per `window`.
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self { clock, window, last_warned: Mutex::new(HashMap::new()) }
    }

    /// Claims the warning slot for this pair. Returns false, leaving the
    /// recorded time untouched, if the last warning is younger than the window.
    pub async fn try_acquire(&self, chat_id: ChatId, user_id: UserId) -> bool {
        let now = self.clock.now();
        let mut last_warned = self.last_warned.lock().await;

        match last_warned.get(&(chat_id, user_id)) {
            Some(last) if now - *last < self.window => false,
            _ => {
                last_warned.insert((chat_id, user_id), now);
                true
            }
        }
    }
}
