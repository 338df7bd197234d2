//! Typing, voice, signaling and moderation operations

use chat_common::{ClientError, ClientResult};
use chat_core::{Permissions, Snowflake, StoreEvent};
use chat_gateway::{ClientEvent, Signal, SignalKind};
use serde_json::Value;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::{now, Session};
use crate::dto::TimeoutRequest;

impl Session {
    /// Tell the channel the local user is typing
    ///
    /// Returns `false` when the previous `typing_start` for this channel is
    /// younger than the resend interval and nothing was sent.
    pub fn start_typing(&mut self, channel_id: Snowflake) -> ClientResult<bool> {
        let now = now();
        self.require_unmuted(now)?;
        self.require(Some(channel_id), Permissions::SEND_MESSAGES)?;
        self.require_connected()?;

        let resend = self.ctx.config().presence.typing_resend();
        if let Some(last) = self.typing_sent.get(&channel_id) {
            if now.instant.saturating_duration_since(*last) < resend {
                return Ok(false);
            }
        }

        self.connection.send(&ClientEvent::TypingStart { channel_id })?;
        self.typing_sent.insert(channel_id, now.instant);
        Ok(true)
    }

    /// Connect to a voice channel
    ///
    /// The local user appears in the roster right away; the server answers
    /// with the authoritative `voice_members`.
    #[instrument(skip(self))]
    pub fn join_voice(&mut self, channel_id: Snowflake) -> ClientResult<Vec<StoreEvent>> {
        self.require(Some(channel_id), Permissions::CONNECT)?;
        self.require_connected()?;

        let me = self.store.local_user();
        if !self
            .store
            .presence
            .voice
            .join(channel_id, me, self.user_name.clone())
        {
            debug!(channel_id = %channel_id, "Already in voice channel");
            return Ok(Vec::new());
        }

        let event = ClientEvent::JoinVoice {
            channel_id,
            user_id: me,
            user_name: self.user_name.clone(),
        };
        if let Err(e) = self.connection.send(&event) {
            self.store.presence.voice.leave(channel_id, me);
            return Err(e);
        }
        Ok(vec![StoreEvent::VoiceRosterChanged { channel_id }])
    }

    /// Disconnect from a voice channel
    #[instrument(skip(self))]
    pub fn leave_voice(&mut self, channel_id: Snowflake) -> ClientResult<Vec<StoreEvent>> {
        let me = self.store.local_user();
        if !self.store.presence.voice.contains(channel_id, me) {
            return Ok(Vec::new());
        }
        self.require_connected()?;

        self.store.presence.voice.leave(channel_id, me);
        let event = ClientEvent::LeaveVoice {
            channel_id,
            user_id: me,
        };
        if let Err(e) = self.connection.send(&event) {
            self.store
                .presence
                .voice
                .join(channel_id, me, self.user_name.clone());
            return Err(e);
        }
        Ok(vec![StoreEvent::VoiceRosterChanged { channel_id }])
    }

    /// Forward an offer, answer or ICE candidate to one peer
    ///
    /// The payload is passed through untouched. The local user must be in
    /// the voice channel the signal is addressed to.
    #[instrument(skip(self, payload))]
    pub fn relay_signal(
        &self,
        kind: SignalKind,
        channel_id: Snowflake,
        target_user_id: Snowflake,
        payload: Value,
    ) -> ClientResult<()> {
        let me = self.store.local_user();
        if !self.store.presence.voice.contains(channel_id, me) {
            return Err(ClientError::validation(format!(
                "Not connected to voice channel {channel_id}"
            )));
        }
        if target_user_id == me {
            return Err(ClientError::validation("Cannot signal yourself"));
        }
        self.require_connected()?;

        let signal = Signal::new(kind, channel_id, me, target_user_id, payload);
        self.connection.send(&ClientEvent::relay(signal))
    }

    /// Time a member out of the guild
    #[instrument(skip(self))]
    pub fn timeout_user(&self, user_id: Snowflake, duration_seconds: u64) -> ClientResult<()> {
        let request = TimeoutRequest {
            user_id,
            duration_seconds,
        };
        request.validate().map_err(ClientError::validation)?;
        if user_id == self.store.local_user() {
            return Err(ClientError::validation("Cannot time out yourself"));
        }
        self.require(None, Permissions::MODERATE_MEMBERS)?;
        self.require_connected()?;

        self.connection.send(&ClientEvent::TimeoutUser {
            user_id,
            duration_seconds,
        })?;
        info!(user_id = %user_id, duration_seconds, "Timeout requested");
        Ok(())
    }
}
