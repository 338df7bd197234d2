//! Store events - notifications of local store changes
//!
//! Returned by every reconciler entry point so observers can re-render only
//! what changed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value_objects::Snowflake;

/// A change applied to the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreEvent {
    // =========================================================================
    // Message Events
    // =========================================================================
    MessageInserted {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
    MessageConfirmed {
        channel_id: Snowflake,
        provisional_id: Snowflake,
        message_id: Snowflake,
    },
    MessageUpdated {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
    MessageRemoved {
        channel_id: Snowflake,
        message_id: Snowflake,
    },
    ReactionsChanged {
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    },
    PinChanged {
        channel_id: Snowflake,
        message_id: Snowflake,
        pinned: bool,
    },
    HistoryMerged {
        channel_id: Snowflake,
        added: usize,
    },
    ChannelCleared {
        channel_id: Snowflake,
    },

    // =========================================================================
    // Presence Events
    // =========================================================================
    TypingChanged {
        channel_id: Snowflake,
    },
    VoiceRosterChanged {
        channel_id: Snowflake,
    },
    ViewersChanged {
        channel_id: Snowflake,
    },
    TimeoutChanged {
        until: Option<DateTime<Utc>>,
    },
}

impl StoreEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageInserted { .. } => "MESSAGE_INSERTED",
            Self::MessageConfirmed { .. } => "MESSAGE_CONFIRMED",
            Self::MessageUpdated { .. } => "MESSAGE_UPDATED",
            Self::MessageRemoved { .. } => "MESSAGE_REMOVED",
            Self::ReactionsChanged { .. } => "REACTIONS_CHANGED",
            Self::PinChanged { .. } => "PIN_CHANGED",
            Self::HistoryMerged { .. } => "HISTORY_MERGED",
            Self::ChannelCleared { .. } => "CHANNEL_CLEARED",
            Self::TypingChanged { .. } => "TYPING_CHANGED",
            Self::VoiceRosterChanged { .. } => "VOICE_ROSTER_CHANGED",
            Self::ViewersChanged { .. } => "VIEWERS_CHANGED",
            Self::TimeoutChanged { .. } => "TIMEOUT_CHANGED",
        }
    }

    /// Channel the change belongs to, if any
    pub fn channel_id(&self) -> Option<Snowflake> {
        match self {
            Self::MessageInserted { channel_id, .. }
            | Self::MessageConfirmed { channel_id, .. }
            | Self::MessageUpdated { channel_id, .. }
            | Self::MessageRemoved { channel_id, .. }
            | Self::ReactionsChanged { channel_id, .. }
            | Self::PinChanged { channel_id, .. }
            | Self::HistoryMerged { channel_id, .. }
            | Self::ChannelCleared { channel_id }
            | Self::TypingChanged { channel_id }
            | Self::VoiceRosterChanged { channel_id }
            | Self::ViewersChanged { channel_id } => Some(*channel_id),
            Self::TimeoutChanged { .. } => None,
        }
    }
}
