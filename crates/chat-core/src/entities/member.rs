//! Member entity - a user's role assignments within a guild

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Guild member as seen by the permission algebra
///
/// `role_ids` holds the explicitly assigned roles. The everyone role is
/// implicit and always added by [`Member::role_set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    #[serde(default)]
    pub role_ids: BTreeSet<Snowflake>,
}

impl Member {
    /// Create a member holding only the everyone role
    pub fn new(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_id,
            role_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Snowflake>) -> Self {
        self.role_ids.extend(roles);
        self
    }

    /// All roles held, the everyone role included
    pub fn role_set(&self) -> BTreeSet<Snowflake> {
        let mut set = self.role_ids.clone();
        set.insert(self.guild_id);
        set
    }

    /// Check if member holds a role (the everyone role always matches)
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        role_id == self.guild_id || self.role_ids.contains(&role_id)
    }
}
