//! Reaction entity - the set of users who reacted with one emoji

use std::collections::BTreeSet;

use crate::value_objects::Snowflake;

/// Users reacting with a single emoji on a message
///
/// The count is always the size of the set and is never stored separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionSet {
    users: BTreeSet<Snowflake>,
}

impl ReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `user_id`; returns true if the user is now present
    pub fn toggle(&mut self, user_id: Snowflake) -> bool {
        if self.users.remove(&user_id) {
            false
        } else {
            self.users.insert(user_id);
            true
        }
    }

    #[inline]
    pub fn contains(&self, user_id: Snowflake) -> bool {
        self.users.contains(&user_id)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.users.iter().copied()
    }
}

impl FromIterator<Snowflake> for ReactionSet {
    fn from_iter<I: IntoIterator<Item = Snowflake>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

/// Aggregated reaction for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: usize,
    pub me: bool,
}

impl ReactionCount {
    pub fn from_set(emoji: &str, set: &ReactionSet, me: Snowflake) -> Self {
        Self {
            emoji: emoji.to_string(),
            count: set.count(),
            me: set.contains(me),
        }
    }
}
