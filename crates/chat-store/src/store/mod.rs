//! The session store: messages per channel, presence, permission snapshot

mod timeline;

use std::collections::HashMap;
use std::time::Instant;

use chat_core::{Message, PermissionSnapshot, Snowflake, StoreEvent};
use chat_presence::PresenceStore;
use chrono::{DateTime, Utc};

pub use timeline::Timeline;

/// A reading of both clocks, taken once per dispatched event
#[derive(Debug, Clone, Copy)]
pub struct Now {
    /// Monotonic time for TTLs
    pub instant: Instant,
    /// Wall clock for timestamps and timeouts
    pub wall: DateTime<Utc>,
}

impl Now {
    pub fn system() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }
}

/// Single authoritative in-memory store of one session
///
/// Only the reconciler entry points ([`Store::apply_optimistic`],
/// [`Store::apply_inbound`], [`Store::merge_page`]) mutate messages; everything
/// else reads.
#[derive(Debug)]
pub struct Store {
    local_user: Snowflake,
    pub(crate) channels: HashMap<Snowflake, Timeline>,
    /// message id → channel id
    pub(crate) index: HashMap<Snowflake, Snowflake>,
    pub presence: PresenceStore,
    pub permissions: PermissionSnapshot,
}

impl Store {
    pub fn new(guild_id: Snowflake, local_user: Snowflake, presence: PresenceStore) -> Self {
        Self {
            local_user,
            channels: HashMap::new(),
            index: HashMap::new(),
            presence,
            permissions: PermissionSnapshot::empty(guild_id, local_user),
        }
    }

    pub fn local_user(&self) -> Snowflake {
        self.local_user
    }

    /// Adopt the user id announced by the server handshake
    pub fn set_local_user(&mut self, user_id: Snowflake) {
        if self.local_user != user_id {
            self.local_user = user_id;
            let guild_id = self.permissions.guild_id();
            self.permissions = PermissionSnapshot::empty(guild_id, user_id);
        }
    }

    pub fn messages(&self, channel_id: Snowflake) -> &[Message] {
        self.channels
            .get(&channel_id)
            .map(Timeline::as_slice)
            .unwrap_or_default()
    }

    pub fn timeline(&self, channel_id: Snowflake) -> Option<&Timeline> {
        self.channels.get(&channel_id)
    }

    pub fn message(&self, message_id: Snowflake) -> Option<&Message> {
        let channel_id = self.index.get(&message_id)?;
        self.channels.get(channel_id)?.get(message_id)
    }

    pub fn channel_of(&self, message_id: Snowflake) -> Option<Snowflake> {
        self.index.get(&message_id).copied()
    }

    pub(crate) fn message_mut(&mut self, message_id: Snowflake) -> Option<&mut Message> {
        let channel_id = self.index.get(&message_id)?;
        self.channels.get_mut(channel_id)?.get_mut(message_id)
    }

    pub(crate) fn insert_message(&mut self, message: Message) {
        self.index.insert(message.id, message.channel_id);
        self.channels
            .entry(message.channel_id)
            .or_default()
            .insert(message);
    }

    pub(crate) fn remove_message(&mut self, message_id: Snowflake) -> Option<Message> {
        let channel_id = self.index.remove(&message_id)?;
        self.channels.get_mut(&channel_id)?.remove(message_id)
    }

    /// Swap the entry stored under `old_id` for `message` (possibly re-keyed)
    pub(crate) fn replace_message(&mut self, old_id: Snowflake, message: Message) {
        self.remove_message(old_id);
        self.insert_message(message);
    }

    /// Drop every message of a channel, pending ones included
    pub fn discard_channel(&mut self, channel_id: Snowflake) -> Vec<StoreEvent> {
        let Some(timeline) = self.channels.remove(&channel_id) else {
            self.presence.clear_channel(channel_id);
            return Vec::new();
        };
        for id in timeline.ids() {
            self.index.remove(&id);
        }
        self.presence.clear_channel(channel_id);

        let pending = timeline.pending().count();
        if pending > 0 {
            tracing::debug!(
                channel_id = %channel_id,
                pending,
                "Discarded pending messages of closed channel"
            );
        }
        vec![StoreEvent::ChannelCleared { channel_id }]
    }

    /// Expire typing indicators
    pub fn sweep_typing(&mut self, now: Instant) -> Vec<StoreEvent> {
        self.presence
            .typing
            .sweep(now)
            .into_iter()
            .map(|channel_id| StoreEvent::TypingChanged { channel_id })
            .collect()
    }

    /// Forget voice state the local user can no longer observe
    pub fn connection_lost(&mut self) -> Vec<StoreEvent> {
        self.presence
            .drop_voice_of(self.local_user)
            .into_iter()
            .map(|channel_id| StoreEvent::VoiceRosterChanged { channel_id })
            .collect()
    }

    /// Whether the local user is muted, clearing an elapsed mute
    pub fn is_muted(&mut self, now: DateTime<Utc>) -> bool {
        self.presence.timeout.is_active(now)
    }

    /// Drop all session state
    pub fn reset(&mut self) {
        self.channels.clear();
        self.index.clear();
        self.presence.reset();
    }
}
