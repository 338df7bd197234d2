//! REST collaborator port
//!
//! The session layer defines what it needs from the request/response API;
//! `chat-api` provides the HTTP implementation and tests provide fakes.
//! Every call is scoped to the guild the implementation was built for.

use async_trait::async_trait;

use crate::entities::{ChannelOverride, Member, Message, OverrideTarget, Role};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for API operations
pub type ApiResult<T> = Result<T, DomainError>;

/// Page request for channel history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    /// Only messages older than this id; `None` for the newest page
    pub before: Option<Snowflake>,
    pub limit: u32,
}

impl MessageQuery {
    /// Newest page of `limit` messages
    pub fn latest(limit: u32) -> Self {
        Self { before: None, limit }
    }

    /// Page of `limit` messages older than `before`
    pub fn before(before: Snowflake, limit: u32) -> Self {
        Self {
            before: Some(before),
            limit,
        }
    }
}

#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Full role table of the guild
    async fn fetch_roles(&self) -> ApiResult<Vec<Role>>;

    /// Role assignments of one member
    async fn fetch_member(&self, user_id: Snowflake) -> ApiResult<Member>;

    /// Override table of one channel
    async fn fetch_overrides(&self, channel_id: Snowflake) -> ApiResult<Vec<ChannelOverride>>;

    /// Create or replace the override for `entry.target`
    async fn put_override(&self, entry: &ChannelOverride) -> ApiResult<()>;

    /// Remove an override
    async fn delete_override(&self, channel_id: Snowflake, target: OverrideTarget) -> ApiResult<()>;

    /// One page of channel history, oldest first
    async fn fetch_messages(&self, channel_id: Snowflake, query: MessageQuery) -> ApiResult<Vec<Message>>;
}
