//! Client to server events

use chat_core::Snowflake;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::signal::{Signal, SignalKind};

/// Every event the client may send
///
/// Serialized as a JSON object tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// First frame after the transport opens
    Identify { token: String, guild_id: Snowflake },

    JoinChannel { channel_id: Snowflake },
    LeaveChannel { channel_id: Snowflake },

    SendMessage {
        channel_id: Snowflake,
        content: String,
        user_id: Snowflake,
        user_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<Snowflake>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nonce: Option<String>,
    },
    EditMessage {
        message_id: Snowflake,
        content: String,
    },
    DeleteMessage {
        message_id: Snowflake,
        channel_id: Snowflake,
    },
    TypingStart { channel_id: Snowflake },
    ToggleReaction {
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    },
    SetPinned {
        channel_id: Snowflake,
        message_id: Snowflake,
        pinned: bool,
    },

    JoinVoice {
        channel_id: Snowflake,
        user_id: Snowflake,
        user_name: String,
    },
    LeaveVoice {
        channel_id: Snowflake,
        user_id: Snowflake,
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

    TimeoutUser {
        user_id: Snowflake,
        duration_seconds: u64,
    },
}

impl ClientEvent {
    /// Wrap a signaling message for relay
    #[must_use]
    pub fn relay(signal: Signal) -> Self {
        let Signal {
            kind,
            channel_id,
            from_user_id,
            target_user_id,
            payload,
        } = signal;
        match kind {
            SignalKind::Offer => Self::VoiceOffer {
                channel_id,
                target_user_id,
                from_user_id,
                sdp: payload,
            },
            SignalKind::Answer => Self::VoiceAnswer {
                channel_id,
                target_user_id,
                from_user_id,
                sdp: payload,
            },
            SignalKind::Candidate => Self::IceCandidate {
                channel_id,
                target_user_id,
                from_user_id,
                candidate: payload,
            },
        }
    }

    /// Wire tag of this event
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Identify { .. } => "identify",
            Self::JoinChannel { .. } => "join_channel",
            Self::LeaveChannel { .. } => "leave_channel",
            Self::SendMessage { .. } => "send_message",
            Self::EditMessage { .. } => "edit_message",
            Self::DeleteMessage { .. } => "delete_message",
            Self::TypingStart { .. } => "typing_start",
            Self::ToggleReaction { .. } => "toggle_reaction",
            Self::SetPinned { .. } => "set_pinned",
            Self::JoinVoice { .. } => "join_voice",
            Self::LeaveVoice { .. } => "leave_voice",
            Self::VoiceOffer { .. } => "voice_offer",
            Self::VoiceAnswer { .. } => "voice_answer",
            Self::IceCandidate { .. } => "ice_candidate",
            Self::TimeoutUser { .. } => "timeout_user",
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
