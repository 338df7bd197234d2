//! Optimistic mutations applied before the server confirms them

use chat_core::{DomainError, Message, Snowflake, StoreEvent};
use chrono::{DateTime, Utc};

use crate::store::Store;

/// A local user action mirrored into the store ahead of its echo
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert a pending message (provisional id, nonce set)
    Send { message: Message },
    Edit {
        message_id: Snowflake,
        content: String,
        at: DateTime<Utc>,
    },
    Delete { message_id: Snowflake },
    ToggleReaction {
        message_id: Snowflake,
        emoji: String,
        user_id: Snowflake,
    },
    SetPinned {
        message_id: Snowflake,
        pinned: bool,
        at: DateTime<Utc>,
    },
}

/// Undo record for one applied mutation
#[derive(Debug, Clone)]
#[must_use]
pub struct Rollback {
    message_id: Snowflake,
    previous: Option<Message>,
}

/// Result of an optimistic mutation
#[derive(Debug)]
pub struct Applied {
    pub events: Vec<StoreEvent>,
    pub rollback: Rollback,
}

impl Applied {
    /// Nothing changed, so nothing needs to be sent
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

impl Store {
    /// Apply a local mutation
    ///
    /// Deleting an absent message succeeds with no events. Editing, reacting
    /// to or pinning an absent message fails with `MessageNotFound`; acting on
    /// a message still pending confirmation fails with `MessagePending`.
    pub fn apply_optimistic(&mut self, mutation: Mutation) -> Result<Applied, DomainError> {
        match mutation {
            Mutation::Send { message } => {
                let event = StoreEvent::MessageInserted {
                    channel_id: message.channel_id,
                    message_id: message.id,
                };
                let rollback = Rollback {
                    message_id: message.id,
                    previous: None,
                };
                self.insert_message(message);
                Ok(Applied {
                    events: vec![event],
                    rollback,
                })
            }

            Mutation::Delete { message_id } => {
                let Some(previous) = self.remove_message(message_id) else {
                    return Ok(Applied {
                        events: Vec::new(),
                        rollback: Rollback {
                            message_id,
                            previous: None,
                        },
                    });
                };
                let channel_id = previous.channel_id;
                Ok(Applied {
                    events: vec![StoreEvent::MessageRemoved {
                        channel_id,
                        message_id,
                    }],
                    rollback: Rollback {
                        message_id,
                        previous: Some(previous),
                    },
                })
            }

            Mutation::Edit {
                message_id,
                content,
                at,
            } => self.mutate_confirmed(message_id, |message| {
                message.edit(content, at);
                Some(StoreEvent::MessageUpdated {
                    channel_id: message.channel_id,
                    message_id,
                })
            }),

            Mutation::ToggleReaction {
                message_id,
                emoji,
                user_id,
            } => self.mutate_confirmed(message_id, |message| {
                message.toggle_reaction(&emoji, user_id);
                Some(StoreEvent::ReactionsChanged {
                    channel_id: message.channel_id,
                    message_id,
                    emoji,
                })
            }),

            Mutation::SetPinned {
                message_id,
                pinned,
                at,
            } => self.mutate_confirmed(message_id, |message| {
                let changed = if pinned { message.pin(at) } else { message.unpin() };
                changed.then_some(StoreEvent::PinChanged {
                    channel_id: message.channel_id,
                    message_id,
                    pinned,
                })
            }),
        }
    }

    fn mutate_confirmed<F>(&mut self, message_id: Snowflake, f: F) -> Result<Applied, DomainError>
    where
        F: FnOnce(&mut Message) -> Option<StoreEvent>,
    {
        let message = self
            .message_mut(message_id)
            .ok_or(DomainError::MessageNotFound(message_id))?;
        if message.is_pending() {
            return Err(DomainError::MessagePending(message_id));
        }

        let previous = message.clone();
        let events: Vec<StoreEvent> = f(message).into_iter().collect();
        Ok(Applied {
            events,
            rollback: Rollback {
                message_id,
                previous: Some(previous),
            },
        })
    }

    /// Undo an optimistic mutation whose outbound event could not be sent
    pub fn rollback(&mut self, rollback: Rollback) -> Vec<StoreEvent> {
        let Rollback {
            message_id,
            previous,
        } = rollback;
        let removed = self.remove_message(message_id);

        match (previous, removed) {
            (Some(previous), _) => {
                let channel_id = previous.channel_id;
                self.insert_message(previous);
                vec![StoreEvent::MessageUpdated {
                    channel_id,
                    message_id,
                }]
            }
            (None, Some(removed)) => vec![StoreEvent::MessageRemoved {
                channel_id: removed.channel_id,
                message_id,
            }],
            (None, None) => Vec::new(),
        }
    }
}
