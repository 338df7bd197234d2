//! Domain errors - error types for the domain layer and its ports

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::value_objects::{Permissions, Snowflake};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Message {0} has not been confirmed yet")]
    MessagePending(Snowflake),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0:?}")]
    MissingPermission(Permissions),

    #[error("Muted until {0}")]
    Muted(DateTime<Utc>),

    #[error("Forbidden by remote: {0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and UI mapping
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::NotFound(_) => "NOT_FOUND",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::MessagePending(_) => "MESSAGE_PENDING",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::Muted(_) => "MUTED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unauthorized => "UNAUTHORIZED",

            // Infrastructure
            Self::ApiError { .. } => "API_ERROR",
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MessageNotFound(_) | Self::ChannelNotFound(_) | Self::NotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyContent
                | Self::ContentTooLong { .. }
                | Self::MessagePending(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::MissingPermission(_) | Self::Muted(_) | Self::Forbidden(_)
        )
    }
}
