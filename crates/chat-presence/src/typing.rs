//! Typing indicators with a time-to-live.
//!
//! Expiry is checked lazily against the `now` passed by the caller, so an
//! entry is never observed past its deadline even if no sweep has run.
//! [`TypingTracker::sweep`] only reclaims memory and reports which channels
//! changed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chat_core::Snowflake;
use serde::Serialize;

/// Default typing indicator TTL (10 seconds)
pub const TYPING_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct TypingEntry {
    user_name: String,
    expires_at: Instant,
}

/// A user currently shown as typing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypingUser {
    pub user_id: Snowflake,
    pub user_name: String,
}

/// Typing state for every channel of one session
#[derive(Debug, Default)]
pub struct TypingTracker {
    channels: HashMap<Snowflake, HashMap<Snowflake, TypingEntry>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or refresh a typing entry to expire at `now + ttl`
    ///
    /// Returns true if the user was not already shown as typing.
    pub fn set_typing(
        &mut self,
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: impl Into<String>,
        now: Instant,
        ttl: Duration,
    ) -> bool {
        let entry = TypingEntry {
            user_name: user_name.into(),
            expires_at: now + ttl,
        };
        let previous = self
            .channels
            .entry(channel_id)
            .or_default()
            .insert(user_id, entry);

        !previous.is_some_and(|p| p.expires_at > now)
    }

    /// Remove a user's entry; returns true if a live entry was removed
    pub fn clear_typing(&mut self, channel_id: Snowflake, user_id: Snowflake, now: Instant) -> bool {
        let Some(users) = self.channels.get_mut(&channel_id) else {
            return false;
        };
        let removed = users.remove(&user_id);
        if users.is_empty() {
            self.channels.remove(&channel_id);
        }
        removed.is_some_and(|entry| entry.expires_at > now)
    }

    /// Whether `user_id` is typing in `channel_id` at `now`
    pub fn is_typing(&self, channel_id: Snowflake, user_id: Snowflake, now: Instant) -> bool {
        self.channels
            .get(&channel_id)
            .and_then(|users| users.get(&user_id))
            .is_some_and(|entry| entry.expires_at > now)
    }

    /// Live typing users in a channel, ordered by name
    pub fn typing_in(&self, channel_id: Snowflake, now: Instant) -> Vec<TypingUser> {
        let mut users: Vec<TypingUser> = self
            .channels
            .get(&channel_id)
            .into_iter()
            .flatten()
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(user_id, entry)| TypingUser {
                user_id: *user_id,
                user_name: entry.user_name.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name).then(a.user_id.cmp(&b.user_id)));
        users
    }

    /// Drop expired entries; returns the channels whose typing set shrank
    pub fn sweep(&mut self, now: Instant) -> Vec<Snowflake> {
        let mut changed = Vec::new();
        self.channels.retain(|channel_id, users| {
            let before = users.len();
            users.retain(|_, entry| entry.expires_at > now);
            if users.len() != before {
                changed.push(*channel_id);
            }
            !users.is_empty()
        });
        if !changed.is_empty() {
            tracing::trace!(channels = changed.len(), "Swept expired typing indicators");
        }
        changed
    }

    /// Forget every entry of a channel
    pub fn clear_channel(&mut self, channel_id: Snowflake) -> bool {
        self.channels.remove(&channel_id).is_some()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
