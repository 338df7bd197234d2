//! Role entity - a guild role with a permission bitmask

use serde::{Deserialize, Serialize};

use crate::value_objects::{Permissions, Snowflake};

/// Role as known to the client
///
/// Roles are reference data: created and edited through the REST API and
/// refreshed wholesale on fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub position: i32,
    pub permissions: Permissions,
}

impl Role {
    /// Create a new Role
    pub fn new(id: Snowflake, name: impl Into<String>, permissions: Permissions) -> Self {
        Self {
            id,
            name: name.into(),
            color: 0,
            position: 0,
            permissions,
        }
    }

    /// The everyone role of a guild shares the guild's id
    pub fn everyone(guild_id: Snowflake, permissions: Permissions) -> Self {
        Self::new(guild_id, "@everyone", permissions)
    }

    /// Whether this is the everyone role of `guild_id`
    #[inline]
    pub fn is_everyone(&self, guild_id: Snowflake) -> bool {
        self.id == guild_id
    }

    /// Compare role positions (higher position = more authority)
    #[inline]
    pub fn is_higher_than(&self, other: &Role) -> bool {
        (self.position, self.id) > (other.position, other.id)
    }

    /// Get the color as a hex string (without #)
    pub fn color_hex(&self) -> String {
        format!("{:06x}", self.color)
    }

    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }
}
