//! Test fixtures and data generators
//!
//! Ids used across the integration tests and builders for the bodies the
//! fake authority serves.

use chat_api::{MemberDto, MessageDto, OverrideDto, OverrideKind};
use chat_core::{Permissions, Role, Snowflake};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const GUILD: Snowflake = Snowflake::new(100);
pub const ALICE: Snowflake = Snowflake::new(1);
pub const BOB: Snowflake = Snowflake::new(2);
pub const GENERAL: Snowflake = Snowflake::new(10);
pub const STAFF_ROOM: Snowflake = Snowflake::new(11);
pub const MODERATOR_ROLE: Snowflake = Snowflake::new(50);

pub const TOKEN: &str = "alice-token";

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Everyone role granting the default permission set
pub fn everyone() -> Role {
    Role::everyone(GUILD, Permissions::DEFAULT)
}

pub fn moderator() -> Role {
    Role::new(
        MODERATOR_ROLE,
        "moderator",
        Permissions::MANAGE_MESSAGES | Permissions::MODERATE_MEMBERS,
    )
    .with_position(1)
}

pub fn member(user_id: Snowflake, role_ids: &[Snowflake]) -> MemberDto {
    MemberDto {
        user_id,
        role_ids: role_ids.to_vec(),
    }
}

/// History message whose timestamp follows its id
pub fn history_message(id: i64, channel_id: Snowflake, author_id: Snowflake, content: &str) -> MessageDto {
    MessageDto {
        id: Snowflake::new(id),
        channel_id,
        author_id,
        author_name: author_name(author_id).to_string(),
        content: content.to_string(),
        created_at: epoch() + Duration::seconds(id),
        edited_at: None,
        reply: None,
        reactions: Vec::new(),
        pinned_at: None,
    }
}

/// `count` messages by bob with ids starting at `first`
pub fn history(channel_id: Snowflake, first: i64, count: i64) -> Vec<MessageDto> {
    (first..first + count)
        .map(|id| history_message(id, channel_id, BOB, &format!("message {id}")))
        .collect()
}

pub fn role_override(role_id: Snowflake, allow: Permissions, deny: Permissions) -> OverrideDto {
    OverrideDto {
        target_id: role_id,
        kind: OverrideKind::Role,
        allow,
        deny,
    }
}

pub fn member_override(user_id: Snowflake, allow: Permissions, deny: Permissions) -> OverrideDto {
    OverrideDto {
        target_id: user_id,
        kind: OverrideKind::Member,
        allow,
        deny,
    }
}

pub fn author_name(user_id: Snowflake) -> &'static str {
    if user_id == ALICE {
        "alice"
    } else if user_id == BOB {
        "bob"
    } else {
        "someone"
    }
}
