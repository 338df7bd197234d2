//! Presence store - all ephemeral state of one session

use std::time::{Duration, Instant};

use chat_core::Snowflake;

use crate::roster::Roster;
use crate::timeout::TimeoutState;
use crate::typing::{TypingTracker, TYPING_TTL};

/// Typing, voice, viewer and timeout state
///
/// Owned by the session store and mutated only from the session loop.
#[derive(Debug)]
pub struct PresenceStore {
    pub typing: TypingTracker,
    pub voice: Roster,
    pub viewers: Roster,
    pub timeout: TimeoutState,
    typing_ttl: Duration,
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new(TYPING_TTL)
    }
}

impl PresenceStore {
    #[must_use]
    pub fn new(typing_ttl: Duration) -> Self {
        Self {
            typing: TypingTracker::new(),
            voice: Roster::new(),
            viewers: Roster::new(),
            timeout: TimeoutState::new(),
            typing_ttl,
        }
    }

    pub fn typing_ttl(&self) -> Duration {
        self.typing_ttl
    }

    /// Record a typing start with the configured TTL
    pub fn typing_started(
        &mut self,
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: impl Into<String>,
        now: Instant,
    ) -> bool {
        self.typing
            .set_typing(channel_id, user_id, user_name, now, self.typing_ttl)
    }

    /// Clear the voice rosters of every channel `user_id` was connected to
    ///
    /// Used when the local connection drops: leave events for our own voice
    /// channels will not arrive.
    pub fn drop_voice_of(&mut self, user_id: Snowflake) -> Vec<Snowflake> {
        let channels = self.voice.channels_with(user_id);
        for channel_id in &channels {
            self.voice.clear_channel(*channel_id);
        }
        if !channels.is_empty() {
            tracing::debug!(
                user_id = %user_id,
                channels = channels.len(),
                "Cleared voice rosters after connection loss"
            );
        }
        channels
    }

    /// Forget per-channel state of a channel being torn down
    pub fn clear_channel(&mut self, channel_id: Snowflake) {
        self.typing.clear_channel(channel_id);
        self.viewers.clear_channel(channel_id);
    }

    /// Forget everything (session deactivation)
    pub fn reset(&mut self) {
        self.typing.clear();
        self.voice.clear();
        self.viewers.clear();
        self.timeout.clear();
    }
}
