//! What one step of the session loop reports to the observer

use chat_core::StoreEvent;
use chat_gateway::Signal;

/// Output of [`Session::next_update`](super::Session::next_update)
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// The store changed
    Store(Vec<StoreEvent>),
    /// Handshake completed; `resumed` is set after a reconnect, when a
    /// resync follows
    Connected { resumed: bool },
    /// The link dropped; `events` holds the presence state that was cleared
    Disconnected { reason: String, events: Vec<StoreEvent> },
    /// Credentials were rejected; no further updates will follow
    AuthFailed { reason: String },
    /// Signaling payload addressed to the local user
    Signal(Signal),
    /// Server-reported failure or a failed resync
    Notice(String),
}

impl Update {
    /// Get the update type name
    pub fn update_type(&self) -> &'static str {
        match self {
            Self::Store(_) => "store",
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::AuthFailed { .. } => "auth_failed",
            Self::Signal(_) => "signal",
            Self::Notice(_) => "notice",
        }
    }

    /// Store events carried by this update, if any
    pub fn store_events(&self) -> &[StoreEvent] {
        match self {
            Self::Store(events) | Self::Disconnected { events, .. } => events,
            _ => &[],
        }
    }
}
