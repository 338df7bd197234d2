//! Pure server-wins merge of an authoritative message onto a local copy

use chat_core::{Delivery, Message};

/// What the authoritative copy is known to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeScope {
    /// A `new_message` event: body and identity only, no reactions or pin
    Echo,
    /// A history page entry: the full current state
    Snapshot,
}

/// Merge `incoming` onto `local`, returning the resulting confirmed message
///
/// A [`MergeScope::Snapshot`] always replaces the body, edited or not. An
/// unedited [`MergeScope::Echo`] describes the message at creation, so it
/// leaves an already edited local body alone. Reactions and the pin are kept
/// from `local` for an echo and taken from `incoming` for a snapshot.
/// Applying the same `incoming` twice yields the same result.
pub fn merge(local: &Message, incoming: Message, scope: MergeScope) -> Message {
    let mut merged = incoming;
    merged.delivery = Delivery::Confirmed;

    if scope == MergeScope::Echo && merged.edited_at.is_none() && local.edited_at.is_some() {
        merged.content.clone_from(&local.content);
        merged.edited_at = local.edited_at;
    }

    if merged.reply.is_none() {
        merged.reply.clone_from(&local.reply);
    }

    if scope == MergeScope::Echo {
        merged.reactions.clone_from(&local.reactions);
        merged.pinned_at = local.pinned_at;
    }

    merged
}
