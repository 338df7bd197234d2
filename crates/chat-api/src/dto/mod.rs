//! Request and response bodies of the REST API and their domain mappers

use chat_core::{
    ChannelOverride, Member, Message, OverrideTarget, Permissions, ReactionSet, ReplyRef, Snowflake,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Default page size
pub const DEFAULT_LIMIT: u32 = 50;
/// Maximum page size
pub const MAX_LIMIT: u32 = chat_common::MAX_HISTORY_PAGE_SIZE;

fn validate_snowflake(id: &Snowflake) -> Result<(), ValidationError> {
    if id.is_zero() || id.is_provisional() {
        return Err(ValidationError::new("invalid_snowflake"));
    }
    Ok(())
}

// === Members ===

/// GET /members/{user_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDto {
    pub user_id: Snowflake,
    #[serde(default)]
    pub role_ids: Vec<Snowflake>,
}

impl MemberDto {
    #[must_use]
    pub fn into_member(self, guild_id: Snowflake) -> Member {
        Member::new(guild_id, self.user_id).with_roles(self.role_ids)
    }
}

// === Overrides ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Role,
    Member,
}

/// Channel permission override as sent and received
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OverrideDto {
    #[validate(custom(function = "validate_snowflake"))]
    pub target_id: Snowflake,
    #[serde(rename = "type")]
    pub kind: OverrideKind,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

impl OverrideDto {
    #[must_use]
    pub fn from_override(entry: &ChannelOverride) -> Self {
        let (kind, target_id) = match entry.target {
            OverrideTarget::Role(id) => (OverrideKind::Role, id),
            OverrideTarget::Member(id) => (OverrideKind::Member, id),
        };
        Self {
            target_id,
            kind,
            allow: entry.allow,
            deny: entry.deny,
        }
    }

    #[must_use]
    pub fn into_override(self, channel_id: Snowflake) -> ChannelOverride {
        let target = match self.kind {
            OverrideKind::Role => OverrideTarget::Role(self.target_id),
            OverrideKind::Member => OverrideTarget::Member(self.target_id),
        };
        ChannelOverride::new(channel_id, target, self.allow, self.deny)
    }
}

// === Messages ===

/// GET /channels/{id}/messages query string
#[derive(Debug, Clone, Serialize, Validate)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Snowflake>,
    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: u32,
}

impl From<chat_core::MessageQuery> for HistoryQuery {
    fn from(q: chat_core::MessageQuery) -> Self {
        Self {
            before: q.before,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDto {
    pub message_id: Snowflake,
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionDto {
    pub emoji: String,
    pub user_ids: Vec<Snowflake>,
}

/// Message in a history page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reply: Option<ReplyDto>,
    #[serde(default)]
    pub reactions: Vec<ReactionDto>,
    #[serde(default)]
    pub pinned_at: Option<DateTime<Utc>>,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        let mut message = Message::new(
            dto.id,
            dto.channel_id,
            dto.author_id,
            dto.author_name,
            dto.content,
            dto.created_at,
        );
        message.edited_at = dto.edited_at;
        message.pinned_at = dto.pinned_at;
        message.reply = dto.reply.map(|r| ReplyRef {
            message_id: r.message_id,
            author_name: r.author_name,
            content: r.content,
        });
        for reaction in dto.reactions {
            let users: ReactionSet = reaction.user_ids.into_iter().collect();
            message.set_reaction_users(&reaction.emoji, users);
        }
        message
    }
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id,
            channel_id: m.channel_id,
            author_id: m.author_id,
            author_name: m.author_name.clone(),
            content: m.content.clone(),
            created_at: m.created_at,
            edited_at: m.edited_at,
            reply: m.reply.as_ref().map(|r| ReplyDto {
                message_id: r.message_id,
                author_name: r.author_name.clone(),
                content: r.content.clone(),
            }),
            reactions: m
                .reactions
                .iter()
                .map(|(emoji, set)| ReactionDto {
                    emoji: emoji.clone(),
                    user_ids: set.users().collect(),
                })
                .collect(),
            pinned_at: m.pinned_at,
        }
    }
}

// === Errors ===

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
