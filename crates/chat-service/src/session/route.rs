//! Dispatch of decoded server events to their consumer

use chat_core::Message;
use chat_gateway::{ServerEvent, Signal, SignalKind};
use chat_store::InboundEvent;

/// Where a decoded server event goes
#[derive(Debug, Clone)]
pub enum Route {
    /// Folded into the store by the reconciler
    Store(InboundEvent),
    /// Handed to the media collaborator untouched
    Signal(Signal),
    /// Server-reported failure, surfaced as a notice
    Notice(String),
    /// Handshake traffic with no meaning after `ready`
    Ignored,
}

impl From<ServerEvent> for Route {
    fn from(event: ServerEvent) -> Self {
        let inbound = match event {
            ServerEvent::Ready { .. } => return Self::Ignored,
            ServerEvent::Error { message } => return Self::Notice(message),

            ServerEvent::VoiceOffer {
                channel_id,
                target_user_id,
                from_user_id,
                sdp,
            } => {
                return Self::Signal(Signal::new(
                    SignalKind::Offer,
                    channel_id,
                    from_user_id,
                    target_user_id,
                    sdp,
                ))
            }
            ServerEvent::VoiceAnswer {
                channel_id,
                target_user_id,
                from_user_id,
                sdp,
            } => {
                return Self::Signal(Signal::new(
                    SignalKind::Answer,
                    channel_id,
                    from_user_id,
                    target_user_id,
                    sdp,
                ))
            }
            ServerEvent::IceCandidate {
                channel_id,
                target_user_id,
                from_user_id,
                candidate,
            } => {
                return Self::Signal(Signal::new(
                    SignalKind::Candidate,
                    channel_id,
                    from_user_id,
                    target_user_id,
                    candidate,
                ))
            }

            ServerEvent::NewMessage { message, nonce } => InboundEvent::MessageCreated {
                message: Message::from(message),
                nonce,
            },
            ServerEvent::MessageEdited {
                message_id,
                content,
                edited_at,
            } => InboundEvent::MessageEdited {
                message_id,
                content,
                edited_at,
            },
            ServerEvent::MessageDeleted { message_id, .. } => {
                InboundEvent::MessageDeleted { message_id }
            }
            ServerEvent::ReactionUpdated {
                message_id,
                emoji,
                user_ids,
                ..
            } => InboundEvent::ReactionUpdated {
                message_id,
                emoji,
                users: user_ids.into_iter().collect(),
            },
            ServerEvent::MessagePinned {
                message_id,
                pinned_at,
                ..
            } => InboundEvent::MessagePinned {
                message_id,
                pinned_at,
            },
            ServerEvent::TypingStart {
                channel_id,
                user_id,
                user_name,
            } => InboundEvent::TypingStarted {
                channel_id,
                user_id,
                user_name,
            },
            ServerEvent::UserJoined {
                channel_id,
                user_id,
                user_name,
            } => InboundEvent::UserJoined {
                channel_id,
                user_id,
                user_name,
            },
            ServerEvent::UserLeft {
                channel_id,
                user_id,
            } => InboundEvent::UserLeft {
                channel_id,
                user_id,
            },
            ServerEvent::VoicePeerJoined {
                channel_id,
                user_id,
                user_name,
            } => InboundEvent::VoicePeerJoined {
                channel_id,
                user_id,
                user_name,
            },
            ServerEvent::VoicePeerLeft {
                channel_id,
                user_id,
            } => InboundEvent::VoicePeerLeft {
                channel_id,
                user_id,
            },
            ServerEvent::VoiceMembers {
                channel_id,
                members,
            } => InboundEvent::VoiceMembers {
                channel_id,
                members,
            },
            ServerEvent::TimedOut { user_id, until } => InboundEvent::TimedOut { user_id, until },
        };
        Self::Store(inbound)
    }
}
