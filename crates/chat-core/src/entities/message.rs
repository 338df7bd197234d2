//! Message entity - a chat message as held by the local store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::reaction::{ReactionCount, ReactionSet};
use crate::value_objects::Snowflake;

/// Snapshot of the message a reply quotes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRef {
    pub message_id: Snowflake,
    pub author_name: String,
    pub content: String,
}

/// Whether a message has been acknowledged by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Inserted locally, waiting for the echo carrying `nonce`
    Pending { nonce: String },
    /// Server-issued id and timestamps
    Confirmed,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub reply: Option<ReplyRef>,
    pub reactions: BTreeMap<String, ReactionSet>,
    pub pinned_at: Option<DateTime<Utc>>,
    pub delivery: Delivery,
}

impl Message {
    /// Create a confirmed message
    pub fn new(
        id: Snowflake,
        channel_id: Snowflake,
        author_id: Snowflake,
        author_name: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel_id,
            author_id,
            author_name: author_name.into(),
            content: content.into(),
            created_at,
            edited_at: None,
            reply: None,
            reactions: BTreeMap::new(),
            pinned_at: None,
            delivery: Delivery::Confirmed,
        }
    }

    /// Mark as a local optimistic insert awaiting its echo
    #[must_use]
    pub fn pending(mut self, nonce: impl Into<String>) -> Self {
        self.delivery = Delivery::Pending {
            nonce: nonce.into(),
        };
        self
    }

    #[must_use]
    pub fn with_reply(mut self, reply: ReplyRef) -> Self {
        self.reply = Some(reply);
        self
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.delivery, Delivery::Pending { .. })
    }

    /// Nonce of a pending message
    pub fn nonce(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Pending { nonce } => Some(nonce),
            Delivery::Confirmed => None,
        }
    }

    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply.is_some()
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pinned_at.is_some()
    }

    /// Replace the body
    pub fn edit(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.content = content.into();
        self.edited_at = Some(at);
    }

    /// Flip `user_id` in the reaction set for `emoji`
    ///
    /// Returns true if the user is now reacting. Empty sets are removed so a
    /// double toggle restores the exact prior map.
    pub fn toggle_reaction(&mut self, emoji: &str, user_id: Snowflake) -> bool {
        let set = self.reactions.entry(emoji.to_string()).or_default();
        let added = set.toggle(user_id);
        if set.is_empty() {
            self.reactions.remove(emoji);
        }
        added
    }

    /// Overwrite the reaction set for `emoji` with an authoritative one
    pub fn set_reaction_users(&mut self, emoji: &str, users: ReactionSet) {
        if users.is_empty() {
            self.reactions.remove(emoji);
        } else {
            self.reactions.insert(emoji.to_string(), users);
        }
    }

    pub fn reaction_count(&self, emoji: &str) -> usize {
        self.reactions.get(emoji).map_or(0, ReactionSet::count)
    }

    /// Reactions aggregated for display from the point of view of `me`
    pub fn reaction_counts(&self, me: Snowflake) -> Vec<ReactionCount> {
        self.reactions
            .iter()
            .map(|(emoji, set)| ReactionCount::from_set(emoji, set, me))
            .collect()
    }

    /// Pin the message; returns false (and keeps the timestamp) if already pinned
    pub fn pin(&mut self, at: DateTime<Utc>) -> bool {
        if self.pinned_at.is_some() {
            return false;
        }
        self.pinned_at = Some(at);
        true
    }

    /// Unpin the message; returns false if it was not pinned
    pub fn unpin(&mut self) -> bool {
        self.pinned_at.take().is_some()
    }

    /// Truncated preview of the body, cut on a char boundary
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }

    /// Reference used when replying to this message
    pub fn as_reply_ref(&self) -> ReplyRef {
        ReplyRef {
            message_id: self.id,
            author_name: self.author_name.clone(),
            content: self.content.clone(),
        }
    }
}
