//! Request DTOs for session operations
//!
//! Every mutating operation validates its request before touching the
//! permission snapshot or the connection.

use chat_core::Snowflake;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Longest timeout the server accepts (28 days)
pub const MAX_TIMEOUT_SECONDS: u64 = 2_419_200;

fn validate_not_blank(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Content cannot be empty".into()));
    }
    Ok(())
}

fn validate_confirmed_id(id: &Snowflake) -> Result<(), ValidationError> {
    if id.is_zero() || id.is_provisional() {
        return Err(ValidationError::new("unconfirmed_id"));
    }
    Ok(())
}

// ============================================================================
// Message Requests
// ============================================================================

/// Send a message, optionally as a reply
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub channel_id: Snowflake,

    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,

    #[validate(custom(function = "validate_confirmed_id"))]
    pub reply_to: Option<Snowflake>,
}

impl SendMessageRequest {
    #[must_use]
    pub fn new(channel_id: Snowflake, content: impl Into<String>) -> Self {
        Self {
            channel_id,
            content: content.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: Snowflake) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Replace the content of one of our own messages
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditMessageRequest {
    pub message_id: Snowflake,

    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,
}

// ============================================================================
// Reaction Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleReactionRequest {
    pub message_id: Snowflake,

    #[validate(length(min = 1, max = 64, message = "Emoji must be 1-64 characters"))]
    pub emoji: String,
}

// ============================================================================
// Moderation Requests
// ============================================================================

/// Time a member out of the guild
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TimeoutRequest {
    #[validate(custom(function = "validate_confirmed_id"))]
    pub user_id: Snowflake,

    #[validate(range(min = 1, max = 2_419_200, message = "Duration must be 1 second to 28 days"))]
    pub duration_seconds: u64,
}
