//! Channel rosters with plain set semantics.
//!
//! Used for voice participants and for the users viewing a text channel.
//! There is no expiry: entries only go away on an explicit leave, a full
//! replace, or a channel clear.

use std::collections::{BTreeMap, HashMap};

use chat_core::Snowflake;
use serde::{Deserialize, Serialize};

/// One participant of a roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub user_id: Snowflake,
    pub user_name: String,
}

impl RosterMember {
    pub fn new(user_id: Snowflake, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// channel → (user → display name)
#[derive(Debug, Default, Clone)]
pub struct Roster {
    channels: HashMap<Snowflake, BTreeMap<Snowflake, String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user; returns true if the roster changed
    pub fn join(&mut self, channel_id: Snowflake, user_id: Snowflake, user_name: impl Into<String>) -> bool {
        let user_name = user_name.into();
        let members = self.channels.entry(channel_id).or_default();
        match members.insert(user_id, user_name.clone()) {
            Some(previous) => previous != user_name,
            None => true,
        }
    }

    /// Remove a user; returns true if the user was present
    pub fn leave(&mut self, channel_id: Snowflake, user_id: Snowflake) -> bool {
        let Some(members) = self.channels.get_mut(&channel_id) else {
            return false;
        };
        let removed = members.remove(&user_id).is_some();
        if members.is_empty() {
            self.channels.remove(&channel_id);
        }
        removed
    }

    /// Replace a channel's roster with an authoritative member list
    pub fn replace(&mut self, channel_id: Snowflake, members: impl IntoIterator<Item = RosterMember>) {
        let members: BTreeMap<_, _> = members
            .into_iter()
            .map(|m| (m.user_id, m.user_name))
            .collect();
        if members.is_empty() {
            self.channels.remove(&channel_id);
        } else {
            self.channels.insert(channel_id, members);
        }
    }

    pub fn contains(&self, channel_id: Snowflake, user_id: Snowflake) -> bool {
        self.channels
            .get(&channel_id)
            .is_some_and(|members| members.contains_key(&user_id))
    }

    /// Members of a channel ordered by user id
    pub fn members_of(&self, channel_id: Snowflake) -> Vec<RosterMember> {
        self.channels
            .get(&channel_id)
            .into_iter()
            .flatten()
            .map(|(user_id, name)| RosterMember::new(*user_id, name.clone()))
            .collect()
    }

    pub fn count(&self, channel_id: Snowflake) -> usize {
        self.channels.get(&channel_id).map_or(0, BTreeMap::len)
    }

    /// Channels in which `user_id` is listed
    pub fn channels_with(&self, user_id: Snowflake) -> Vec<Snowflake> {
        let mut channels: Vec<_> = self
            .channels
            .iter()
            .filter(|(_, members)| members.contains_key(&user_id))
            .map(|(channel_id, _)| *channel_id)
            .collect();
        channels.sort();
        channels
    }

    /// Drop a whole channel; returns true if it had members
    pub fn clear_channel(&mut self, channel_id: Snowflake) -> bool {
        self.channels.remove(&channel_id).is_some()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
