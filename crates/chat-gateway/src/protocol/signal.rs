//! Voice signaling relay
//!
//! Offer, answer and ICE candidate payloads are forwarded between two peers
//! as opaque JSON. Only the addressing is read.

use chat_core::Snowflake;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of negotiation message being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    /// Wire tag of the event carrying this kind
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Offer => "voice_offer",
            Self::Answer => "voice_answer",
            Self::Candidate => "ice_candidate",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// An addressed signaling message
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    pub channel_id: Snowflake,
    pub from_user_id: Snowflake,
    pub target_user_id: Snowflake,
    pub payload: Value,
}

impl Signal {
    #[must_use]
    pub fn new(
        kind: SignalKind,
        channel_id: Snowflake,
        from_user_id: Snowflake,
        target_user_id: Snowflake,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            channel_id,
            from_user_id,
            target_user_id,
            payload,
        }
    }
}
