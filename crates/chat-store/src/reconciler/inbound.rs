//! Authoritative events received from the server

use chat_core::{Message, ReactionSet, Snowflake, StoreEvent};
use chat_presence::RosterMember;
use chrono::{DateTime, Utc};

use super::resolve::{merge, MergeScope};
use crate::store::{Now, Store};

/// Which end of the history a page comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Newest messages (channel open, resync)
    Latest,
    /// Scroll-back before the oldest known message
    Older,
}

/// A decoded server event that affects the store
#[derive(Debug, Clone)]
pub enum InboundEvent {
    MessageCreated {
        message: Message,
        nonce: Option<String>,
    },
    MessageEdited {
        message_id: Snowflake,
        content: String,
        edited_at: DateTime<Utc>,
    },
    MessageDeleted {
        message_id: Snowflake,
    },
    ReactionUpdated {
        message_id: Snowflake,
        emoji: String,
        users: ReactionSet,
    },
    MessagePinned {
        message_id: Snowflake,
        pinned_at: Option<DateTime<Utc>>,
    },
    TypingStarted {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    UserJoined {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    UserLeft {
        channel_id: Snowflake,
        user_id: Snowflake,
    },
    VoicePeerJoined {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    VoicePeerLeft {
        channel_id: Snowflake,
        user_id: Snowflake,
    },
    VoiceMembers {
        channel_id: Snowflake,
        members: Vec<RosterMember>,
    },
    TimedOut {
        user_id: Snowflake,
        until: DateTime<Utc>,
    },
}

impl Store {
    /// Apply an authoritative event
    ///
    /// Replaying an event yields no further change. Events naming an unknown
    /// message are ignored.
    pub fn apply_inbound(&mut self, event: InboundEvent, now: Now) -> Vec<StoreEvent> {
        match event {
            InboundEvent::MessageCreated { message, nonce } => {
                let mut events = Vec::new();
                if self
                    .presence
                    .typing
                    .clear_typing(message.channel_id, message.author_id, now.instant)
                {
                    events.push(StoreEvent::TypingChanged {
                        channel_id: message.channel_id,
                    });
                }
                events.extend(self.absorb(message, nonce.as_deref(), MergeScope::Echo, true));
                events
            }

            InboundEvent::MessageEdited {
                message_id,
                content,
                edited_at,
            } => {
                let Some(message) = self.message_mut(message_id) else {
                    tracing::debug!(message_id = %message_id, "Edit for unknown message ignored");
                    return Vec::new();
                };
                if message.content == content && message.edited_at == Some(edited_at) {
                    return Vec::new();
                }
                message.edit(content, edited_at);
                vec![StoreEvent::MessageUpdated {
                    channel_id: message.channel_id,
                    message_id,
                }]
            }

            InboundEvent::MessageDeleted { message_id } => match self.remove_message(message_id) {
                Some(removed) => vec![StoreEvent::MessageRemoved {
                    channel_id: removed.channel_id,
                    message_id,
                }],
                None => Vec::new(),
            },

            InboundEvent::ReactionUpdated {
                message_id,
                emoji,
                users,
            } => {
                let Some(message) = self.message_mut(message_id) else {
                    return Vec::new();
                };
                let current = message.reactions.get(&emoji).cloned().unwrap_or_default();
                if current == users {
                    return Vec::new();
                }
                message.set_reaction_users(&emoji, users);
                vec![StoreEvent::ReactionsChanged {
                    channel_id: message.channel_id,
                    message_id,
                    emoji,
                }]
            }

            InboundEvent::MessagePinned {
                message_id,
                pinned_at,
            } => {
                let Some(message) = self.message_mut(message_id) else {
                    return Vec::new();
                };
                if message.pinned_at == pinned_at {
                    return Vec::new();
                }
                message.pinned_at = pinned_at;
                vec![StoreEvent::PinChanged {
                    channel_id: message.channel_id,
                    message_id,
                    pinned: pinned_at.is_some(),
                }]
            }

            InboundEvent::TypingStarted {
                channel_id,
                user_id,
                user_name,
            } => {
                if user_id == self.local_user() {
                    return Vec::new();
                }
                if self
                    .presence
                    .typing_started(channel_id, user_id, user_name, now.instant)
                {
                    vec![StoreEvent::TypingChanged { channel_id }]
                } else {
                    Vec::new()
                }
            }

            InboundEvent::UserJoined {
                channel_id,
                user_id,
                user_name,
            } => self
                .presence
                .viewers
                .join(channel_id, user_id, user_name)
                .then_some(StoreEvent::ViewersChanged { channel_id })
                .into_iter()
                .collect(),

            InboundEvent::UserLeft {
                channel_id,
                user_id,
            } => self
                .presence
                .viewers
                .leave(channel_id, user_id)
                .then_some(StoreEvent::ViewersChanged { channel_id })
                .into_iter()
                .collect(),

            InboundEvent::VoicePeerJoined {
                channel_id,
                user_id,
                user_name,
            } => self
                .presence
                .voice
                .join(channel_id, user_id, user_name)
                .then_some(StoreEvent::VoiceRosterChanged { channel_id })
                .into_iter()
                .collect(),

            InboundEvent::VoicePeerLeft {
                channel_id,
                user_id,
            } => self
                .presence
                .voice
                .leave(channel_id, user_id)
                .then_some(StoreEvent::VoiceRosterChanged { channel_id })
                .into_iter()
                .collect(),

            InboundEvent::VoiceMembers {
                channel_id,
                mut members,
            } => {
                members.sort_by_key(|m| m.user_id);
                members.dedup_by_key(|m| m.user_id);
                if self.presence.voice.members_of(channel_id) == members {
                    return Vec::new();
                }
                self.presence.voice.replace(channel_id, members);
                vec![StoreEvent::VoiceRosterChanged { channel_id }]
            }

            InboundEvent::TimedOut { user_id, until } => {
                if user_id != self.local_user() {
                    return Vec::new();
                }
                let before = self.presence.timeout.until();
                self.presence.timeout.set(until, now.wall);
                let after = self.presence.timeout.until();
                if before == after {
                    return Vec::new();
                }
                tracing::info!(until = %until, "Local user timed out");
                vec![StoreEvent::TimeoutChanged { until: after }]
            }
        }
    }

    /// Merge a page of history into a channel, deduplicating by id
    ///
    /// Only a [`PageKind::Latest`] page may confirm pending messages; older
    /// pages predate anything sent in this session.
    pub fn merge_page(&mut self, channel_id: Snowflake, page: Vec<Message>, kind: PageKind) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        let mut added = 0;
        for message in page {
            if message.channel_id != channel_id {
                tracing::warn!(
                    channel_id = %channel_id,
                    message_id = %message.id,
                    "History page contained a message of another channel"
                );
                continue;
            }
            let match_pending = kind == PageKind::Latest;
            for event in self.absorb(message, None, MergeScope::Snapshot, match_pending) {
                match event {
                    StoreEvent::MessageInserted { .. } => added += 1,
                    other => events.push(other),
                }
            }
        }
        events.push(StoreEvent::HistoryMerged { channel_id, added });
        events
    }

    /// Insert a confirmed message or fold it into the local entry it confirms
    fn absorb(
        &mut self,
        message: Message,
        nonce: Option<&str>,
        scope: MergeScope,
        match_pending: bool,
    ) -> Vec<StoreEvent> {
        let channel_id = message.channel_id;
        let message_id = message.id;

        if let Some(local) = self.message(message_id) {
            let merged = merge(local, message, scope);
            if &merged == local {
                return Vec::new();
            }
            self.replace_message(message_id, merged);
            return vec![StoreEvent::MessageUpdated {
                channel_id,
                message_id,
            }];
        }

        let pending_id = self.timeline(channel_id).filter(|_| match_pending).and_then(|timeline| {
            nonce
                .and_then(|n| timeline.find_by_nonce(n))
                .or_else(|| timeline.find_pending_like(message.author_id, &message.content))
                .map(|m| m.id)
        });

        if let Some(provisional_id) = pending_id {
            if let Some(local) = self.message(provisional_id) {
                let merged = merge(local, message, scope);
                self.replace_message(provisional_id, merged);
                tracing::debug!(
                    channel_id = %channel_id,
                    provisional_id = %provisional_id,
                    message_id = %message_id,
                    "Pending message confirmed"
                );
                return vec![StoreEvent::MessageConfirmed {
                    channel_id,
                    provisional_id,
                    message_id,
                }];
            }
        }

        self.insert_message(message);
        vec![StoreEvent::MessageInserted {
            channel_id,
            message_id,
        }]
    }
}
