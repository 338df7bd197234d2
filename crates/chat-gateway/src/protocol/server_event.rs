//! Server to client events

use chat_core::Snowflake;
use chat_presence::RosterMember;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payloads::MessagePayload;

/// Every event the server may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Handshake accepted
    Ready { user_id: Snowflake, user_name: String },

    NewMessage {
        message: MessagePayload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nonce: Option<String>,
    },
    MessageEdited {
        message_id: Snowflake,
        content: String,
        edited_at: DateTime<Utc>,
    },
    MessageDeleted {
        message_id: Snowflake,
        channel_id: Snowflake,
    },
    ReactionUpdated {
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
        user_ids: Vec<Snowflake>,
    },
    MessagePinned {
        channel_id: Snowflake,
        message_id: Snowflake,
        #[serde(default)]
        pinned_at: Option<DateTime<Utc>>,
    },
    TypingStart {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },

    UserJoined {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    UserLeft {
        channel_id: Snowflake,
        user_id: Snowflake,
    },

    VoicePeerJoined {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    VoicePeerLeft {
        channel_id: Snowflake,
        user_id: Snowflake,
    },
    VoiceMembers {
        channel_id: Snowflake,
        members: Vec<RosterMember>,
    },
    VoiceOffer {
        channel_id: Snowflake,
        target_user_id: Snowflake,
        from_user_id: Snowflake,
        sdp: Value,
    },
    VoiceAnswer {
        channel_id: Snowflake,
        target_user_id: Snowflake,
        from_user_id: Snowflake,
        sdp: Value,
    },
    IceCandidate {
        channel_id: Snowflake,
        target_user_id: Snowflake,
        from_user_id: Snowflake,
        candidate: Value,
    },

    TimedOut {
        user_id: Snowflake,
        until: DateTime<Utc>,
    },

    Error { message: String },
}

impl ServerEvent {
    /// Wire tag of this event
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::NewMessage { .. } => "new_message",
            Self::MessageEdited { .. } => "message_edited",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::ReactionUpdated { .. } => "reaction_updated",
            Self::MessagePinned { .. } => "message_pinned",
            Self::TypingStart { .. } => "typing_start",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::VoicePeerJoined { .. } => "voice_peer_joined",
            Self::VoicePeerLeft { .. } => "voice_peer_left",
            Self::VoiceMembers { .. } => "voice_members",
            Self::VoiceOffer { .. } => "voice_offer",
            Self::VoiceAnswer { .. } => "voice_answer",
            Self::IceCandidate { .. } => "ice_candidate",
            Self::TimedOut { .. } => "timed_out",
            Self::Error { .. } => "error",
        }
    }

    /// Parse a JSON text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
