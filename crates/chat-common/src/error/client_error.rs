//! Client error types
//!
//! Unified error handling for the session layer.

use std::fmt;

use chat_core::DomainError;

use crate::config::ConfigError;

/// Session-wide error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connection is not established; retried by the connection manager
    #[error("Not connected: {0}")]
    Connection(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Target id is unknown or already deleted
    #[error("Stale reference: {0}")]
    StaleReference(String),

    /// Token rejected; the session cannot continue
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

/// Coarse classification used by callers deciding how to present an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    PermissionDenied,
    Validation,
    StaleReference,
    Auth,
    Api,
    Protocol,
    Config,
    Internal,
}

impl ClientError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Validation(_) => ErrorKind::Validation,
            Self::StaleReference(_) => ErrorKind::StaleReference,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Api { .. } => ErrorKind::Api,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get error code for logs and UI mapping
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StaleReference(_) => "STALE_REFERENCE",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors that resolve themselves once the connection is back
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Errors treated as a no-op and not shown to the user
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::StaleReference(_))
    }

    /// Errors after which the session must be re-authenticated
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    #[must_use]
    pub fn connection(msg: impl fmt::Display) -> Self {
        Self::Connection(msg.to_string())
    }

    #[must_use]
    pub fn permission_denied(msg: impl fmt::Display) -> Self {
        Self::PermissionDenied(msg.to_string())
    }

    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    #[must_use]
    pub fn stale(reference: impl fmt::Display) -> Self {
        Self::StaleReference(reference.to_string())
    }

    #[must_use]
    pub fn protocol(msg: impl fmt::Display) -> Self {
        Self::Protocol(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<DomainError> for ClientError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Unauthorized => Self::Auth(err.to_string()),
            DomainError::ApiError { status, message } => Self::Api { status, message },
            DomainError::TransportError(msg) => Self::Connection(msg),
            DomainError::InternalError(msg) => Self::Internal(anyhow::anyhow!(msg)),
            e if e.is_not_found() => Self::StaleReference(e.to_string()),
            e if e.is_authorization() => Self::PermissionDenied(e.to_string()),
            e if e.is_validation() => Self::Validation(e.to_string()),
            e => Self::Internal(anyhow::anyhow!(e.to_string())),
        }
    }
}

/// Result type alias for session operations
pub type ClientResult<T> = Result<T, ClientError>;
