//! Locally known permission data for one guild

use std::collections::HashMap;

use super::compute::{effective_permissions, highest_role};
use crate::entities::{ChannelOverride, Member, OverrideTable, OverrideTarget, Role};
use crate::value_objects::{Permissions, Snowflake};

/// Roles, the local member and per-channel overrides as last fetched
///
/// Local checks against this snapshot are advisory; the server re-validates
/// every mutation.
#[derive(Debug, Clone)]
pub struct PermissionSnapshot {
    guild_id: Snowflake,
    member: Member,
    roles: HashMap<Snowflake, Role>,
    overrides: HashMap<Snowflake, OverrideTable>,
}

impl PermissionSnapshot {
    /// Snapshot with no roles known; every check fails closed
    pub fn empty(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            guild_id,
            member: Member::new(guild_id, user_id),
            roles: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn role(&self, id: Snowflake) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Replace the whole role table
    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = Role>) {
        self.roles = roles.into_iter().map(|role| (role.id, role)).collect();
    }

    pub fn set_member(&mut self, member: Member) {
        self.member = member;
    }

    /// Replace the override table of one channel
    pub fn set_overrides(&mut self, channel_id: Snowflake, overrides: impl IntoIterator<Item = ChannelOverride>) {
        self.overrides.insert(channel_id, overrides.into_iter().collect());
    }

    pub fn upsert_override(&mut self, entry: ChannelOverride) {
        self.overrides.entry(entry.channel_id).or_default().upsert(entry);
    }

    pub fn remove_override(&mut self, channel_id: Snowflake, target: OverrideTarget) -> Option<ChannelOverride> {
        self.overrides.get_mut(&channel_id)?.remove(target)
    }

    pub fn overrides_for(&self, channel_id: Snowflake) -> Option<&OverrideTable> {
        self.overrides.get(&channel_id)
    }

    /// Guild-wide permissions of the local member
    pub fn guild_permissions(&self) -> Permissions {
        effective_permissions(&self.member, &self.roles, None)
    }

    /// Permissions of the local member in `channel_id`
    pub fn permissions_in(&self, channel_id: Snowflake) -> Permissions {
        effective_permissions(&self.member, &self.roles, self.overrides.get(&channel_id))
    }

    /// Check a permission in a channel, or guild-wide when `channel_id` is `None`
    pub fn allows(&self, channel_id: Option<Snowflake>, permission: Permissions) -> bool {
        match channel_id {
            Some(channel) => self.permissions_in(channel).has(permission),
            None => self.guild_permissions().has(permission),
        }
    }

    /// Display color of the local member (0 when no colored role)
    pub fn display_color(&self) -> u32 {
        highest_role(&self.member, &self.roles).map_or(0, |role| role.color)
    }
}
