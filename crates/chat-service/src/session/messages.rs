//! Message operations: send, reply, edit, delete, react, pin

use chat_common::{ClientError, ClientResult};
use chat_core::{DomainError, Message, Permissions, Snowflake, StoreEvent};
use chat_gateway::ClientEvent;
use chat_store::Mutation;
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{now, stale, Session, Target};
use crate::dto::{EditMessageRequest, SendMessageRequest, ToggleReactionRequest};

impl Session {
    /// Send a message to a channel
    ///
    /// The message shows up immediately as pending under a provisional id
    /// and is confirmed when the server echoes it back.
    pub fn send_message(
        &mut self,
        channel_id: Snowflake,
        content: impl Into<String>,
    ) -> ClientResult<Vec<StoreEvent>> {
        self.submit(SendMessageRequest::new(channel_id, content))
    }

    /// Send a message quoting another one of the same channel
    pub fn send_reply(
        &mut self,
        channel_id: Snowflake,
        reply_to: Snowflake,
        content: impl Into<String>,
    ) -> ClientResult<Vec<StoreEvent>> {
        self.submit(SendMessageRequest::new(channel_id, content).reply_to(reply_to))
    }

    #[instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    fn submit(&mut self, request: SendMessageRequest) -> ClientResult<Vec<StoreEvent>> {
        request.validate().map_err(ClientError::validation)?;
        self.check_length(&request.content)?;

        let reply = match request.reply_to {
            Some(reply_to) => match self.store.message(reply_to) {
                Some(quoted) if quoted.channel_id != request.channel_id => {
                    return Err(ClientError::validation(
                        "Reply must quote a message of the same channel",
                    ));
                }
                Some(quoted) => Some(quoted.as_reply_ref()),
                None => return Ok(stale(format!("reply target {reply_to}"))),
            },
            None => None,
        };

        let now = now();
        self.require_unmuted(now)?;
        self.require(Some(request.channel_id), Permissions::SEND_MESSAGES)?;
        self.require_connected()?;

        let me = self.store.local_user();
        let nonce = Uuid::new_v4().to_string();
        let mut message = Message::new(
            self.ctx.next_provisional_id(),
            request.channel_id,
            me,
            self.user_name.clone(),
            request.content.clone(),
            now.wall,
        )
        .pending(nonce.clone());
        if let Some(reply) = &reply {
            message = message.with_reply(reply.clone());
        }

        let applied = self.store.apply_optimistic(Mutation::Send { message })?;
        let event = ClientEvent::SendMessage {
            channel_id: request.channel_id,
            content: request.content,
            user_id: me,
            user_name: self.user_name.clone(),
            reply_to: reply.map(|r| r.message_id),
            nonce: Some(nonce),
        };
        let events = self.commit(applied, &event)?;

        // A sent message ends the typing burst
        self.typing_sent.remove(&request.channel_id);
        Ok(events)
    }

    /// Replace the content of one of the local user's messages
    ///
    /// Needs `SEND_MESSAGES` in the message's channel.
    #[instrument(skip(self, content))]
    pub fn edit_message(
        &mut self,
        message_id: Snowflake,
        content: impl Into<String>,
    ) -> ClientResult<Vec<StoreEvent>> {
        let request = EditMessageRequest {
            message_id,
            content: content.into(),
        };
        request.validate().map_err(ClientError::validation)?;
        self.check_length(&request.content)?;

        let Some(target) = self.confirmed_target(message_id)? else {
            return Ok(stale(message_id));
        };
        if target.author_id != self.store.local_user() {
            return Err(ClientError::permission_denied("Only the author can edit a message"));
        }
        self.require(Some(target.channel_id), Permissions::SEND_MESSAGES)?;
        self.require_connected()?;

        let applied = self.store.apply_optimistic(Mutation::Edit {
            message_id,
            content: request.content.clone(),
            at: now().wall,
        })?;
        self.commit(
            applied,
            &ClientEvent::EditMessage {
                message_id,
                content: request.content,
            },
        )
    }

    /// Delete a message
    ///
    /// Authors may always delete their own messages; anything else needs
    /// `MANAGE_MESSAGES` in the channel. Deleting an unknown id does nothing.
    #[instrument(skip(self))]
    pub fn delete_message(&mut self, message_id: Snowflake) -> ClientResult<Vec<StoreEvent>> {
        let Some(target) = self.confirmed_target(message_id)? else {
            debug!(message_id = %message_id, "Delete of unknown message is a no-op");
            return Ok(Vec::new());
        };
        if target.author_id != self.store.local_user() {
            self.require(Some(target.channel_id), Permissions::MANAGE_MESSAGES)?;
        }
        self.require_connected()?;

        let applied = self.store.apply_optimistic(Mutation::Delete { message_id })?;
        self.commit(
            applied,
            &ClientEvent::DeleteMessage {
                message_id,
                channel_id: target.channel_id,
            },
        )
    }

    /// Add or remove the local user's reaction
    #[instrument(skip(self, emoji))]
    pub fn toggle_reaction(
        &mut self,
        message_id: Snowflake,
        emoji: impl Into<String>,
    ) -> ClientResult<Vec<StoreEvent>> {
        let request = ToggleReactionRequest {
            message_id,
            emoji: emoji.into(),
        };
        request.validate().map_err(ClientError::validation)?;

        let Some(target) = self.confirmed_target(message_id)? else {
            return Ok(stale(message_id));
        };
        self.require(Some(target.channel_id), Permissions::ADD_REACTIONS)?;
        self.require_connected()?;

        let applied = self.store.apply_optimistic(Mutation::ToggleReaction {
            message_id,
            emoji: request.emoji.clone(),
            user_id: self.store.local_user(),
        })?;
        self.commit(
            applied,
            &ClientEvent::ToggleReaction {
                channel_id: target.channel_id,
                message_id,
                emoji: request.emoji,
            },
        )
    }

    /// Pin or unpin a message
    ///
    /// Setting the state the message is already in sends nothing.
    #[instrument(skip(self))]
    pub fn set_pinned(&mut self, message_id: Snowflake, pinned: bool) -> ClientResult<Vec<StoreEvent>> {
        let Some(target) = self.confirmed_target(message_id)? else {
            return Ok(stale(message_id));
        };
        self.require(Some(target.channel_id), Permissions::PIN_MESSAGES)?;
        self.require_connected()?;

        let applied = self.store.apply_optimistic(Mutation::SetPinned {
            message_id,
            pinned,
            at: now().wall,
        })?;
        if applied.is_noop() {
            return Ok(Vec::new());
        }
        self.commit(
            applied,
            &ClientEvent::SetPinned {
                channel_id: target.channel_id,
                message_id,
                pinned,
            },
        )
    }

    /// Flip the pinned state of a message
    pub fn toggle_pin(&mut self, message_id: Snowflake) -> ClientResult<Vec<StoreEvent>> {
        match self.target(message_id) {
            Some(target) => self.set_pinned(message_id, !target.pinned),
            None => Ok(stale(message_id)),
        }
    }

    /// Look up a message that may be acted on
    ///
    /// `None` for an unknown id; pending messages are rejected until the
    /// server confirms them.
    fn confirmed_target(&self, message_id: Snowflake) -> ClientResult<Option<Target>> {
        match self.target(message_id) {
            Some(target) if target.pending => Err(DomainError::MessagePending(message_id).into()),
            other => Ok(other),
        }
    }

    fn check_length(&self, content: &str) -> ClientResult<()> {
        let max = self.ctx.config().limits.max_message_length;
        if content.chars().count() > max {
            return Err(DomainError::ContentTooLong { max }.into());
        }
        Ok(())
    }
}
