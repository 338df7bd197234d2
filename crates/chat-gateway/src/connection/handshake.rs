//! Identify / ready exchange run on every fresh link

use chat_core::Snowflake;

use super::transport::{Frame, Link, TransportError};
use crate::protocol::{is_fatal_close, ClientEvent, ServerEvent};

/// Credentials sent in `identify`
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: String,
    pub guild_id: Snowflake,
}

/// Who the server says we are
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub user_id: Snowflake,
    pub user_name: String,
}

/// Error type for the handshake
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Identify rejected: {0}")]
    Rejected(String),

    #[error("Closed during handshake (code {0:?})")]
    Closed(Option<u16>),

    #[error("Handshake timed out")]
    Timeout,

    #[error("Invalid handshake frame: {0}")]
    Protocol(String),
}

impl HandshakeError {
    /// Retrying with the same credentials cannot succeed
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Rejected(_) => true,
            Self::Closed(code) => is_fatal_close(*code),
            _ => false,
        }
    }
}

/// Send `identify` and wait for `ready`
///
/// Events that arrive before `ready` are dropped; the session resyncs after
/// connecting anyway.
pub async fn handshake(link: &mut dyn Link, identity: &Identity) -> Result<Ready, HandshakeError> {
    let identify = ClientEvent::Identify {
        token: identity.token.clone(),
        guild_id: identity.guild_id,
    };
    let text = identify
        .to_json()
        .map_err(|e| HandshakeError::Protocol(e.to_string()))?;
    link.send(text).await?;

    loop {
        let frame = match link.recv().await {
            Some(frame) => frame?,
            None => return Err(HandshakeError::Closed(None)),
        };

        let text = match frame {
            Frame::Text(text) => text,
            Frame::Close(code) if is_fatal_close(code) => {
                return Err(HandshakeError::Rejected(format!("closed with code {code:?}")));
            }
            Frame::Close(code) => return Err(HandshakeError::Closed(code)),
        };

        match ServerEvent::from_json(&text) {
            Ok(ServerEvent::Ready { user_id, user_name }) => return Ok(Ready { user_id, user_name }),
            Ok(ServerEvent::Error { message }) => return Err(HandshakeError::Rejected(message)),
            Ok(other) => {
                tracing::trace!(event_type = other.event_type(), "Event before ready dropped");
            }
            Err(e) => return Err(HandshakeError::Protocol(e.to_string())),
        }
    }
}
