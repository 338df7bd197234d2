//! Payload structures shared by several gateway events

use chat_core::{Message, ReactionSet, ReplyRef, Snowflake};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quoted message attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub message_id: Snowflake,
    pub author_name: String,
    pub content: String,
}

impl From<ReplyPayload> for ReplyRef {
    fn from(p: ReplyPayload) -> Self {
        Self {
            message_id: p.message_id,
            author_name: p.author_name,
            content: p.content,
        }
    }
}

/// Users that reacted with one emoji
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionPayload {
    pub emoji: String,
    pub user_ids: Vec<Snowflake>,
}

/// Message as carried by `new_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyPayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<ReactionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<DateTime<Utc>>,
}

impl MessagePayload {
    /// Wire form of a confirmed message
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author_id,
            author_name: message.author_name.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
            edited_at: message.edited_at,
            reply: message.reply.as_ref().map(|r| ReplyPayload {
                message_id: r.message_id,
                author_name: r.author_name.clone(),
                content: r.content.clone(),
            }),
            reactions: message
                .reactions
                .iter()
                .map(|(emoji, set)| ReactionPayload {
                    emoji: emoji.clone(),
                    user_ids: set.users().collect(),
                })
                .collect(),
            pinned_at: message.pinned_at,
        }
    }
}

impl From<MessagePayload> for Message {
    fn from(p: MessagePayload) -> Self {
        let mut message = Message::new(
            p.id,
            p.channel_id,
            p.author_id,
            p.author_name,
            p.content,
            p.created_at,
        );
        message.edited_at = p.edited_at;
        message.reply = p.reply.map(ReplyRef::from);
        message.pinned_at = p.pinned_at;
        for reaction in p.reactions {
            let users: ReactionSet = reaction.user_ids.into_iter().collect();
            message.set_reaction_users(&reaction.emoji, users);
        }
        message
    }
}
