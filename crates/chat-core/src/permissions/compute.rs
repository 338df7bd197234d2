//! Effective permission computation
//!
//! Tiers, least to most authoritative:
//! 1. union of every role the member holds (everyone included)
//! 2. everyone channel override
//! 3. union of the matching non-everyone role overrides
//! 4. member channel override
//!
//! ADMINISTRATOR in the role union short-circuits to every permission.

use std::collections::HashMap;

use crate::entities::{Member, OverrideTable, OverrideTarget, Role};
use crate::value_objects::{Permissions, Snowflake};

/// Role-level permissions of a member, no channel context
///
/// Role ids missing from `roles` contribute nothing.
pub fn base_permissions(member: &Member, roles: &HashMap<Snowflake, Role>) -> Permissions {
    let base = Permissions::combine(
        member
            .role_set()
            .iter()
            .filter_map(|id| roles.get(id))
            .map(|role| role.permissions),
    );

    if base.contains(Permissions::ADMINISTRATOR) {
        return Permissions::ALL;
    }
    base
}

/// Permissions of `member`, optionally narrowed to one channel's overrides
pub fn effective_permissions(
    member: &Member,
    roles: &HashMap<Snowflake, Role>,
    overrides: Option<&OverrideTable>,
) -> Permissions {
    let mut perms = base_permissions(member, roles);
    if perms.contains(Permissions::ADMINISTRATOR) {
        return perms;
    }

    let Some(overrides) = overrides else {
        return perms;
    };
    if overrides.is_empty() {
        return perms;
    }

    if let Some(everyone) = overrides.get(OverrideTarget::Role(member.guild_id)) {
        perms = everyone.apply(perms);
    }

    let mut role_allow = Permissions::empty();
    let mut role_deny = Permissions::empty();
    for entry in overrides.iter() {
        if let OverrideTarget::Role(role_id) = entry.target {
            if role_id != member.guild_id && member.role_ids.contains(&role_id) {
                role_allow |= entry.allow;
                role_deny |= entry.deny;
            }
        }
    }
    perms = perms.apply_override(role_allow, role_deny);

    if let Some(own) = overrides.get(OverrideTarget::Member(member.user_id)) {
        perms = own.apply(perms);
    }

    perms
}

/// Top-positioned role held by the member, used for display color
pub fn highest_role<'a>(member: &Member, roles: &'a HashMap<Snowflake, Role>) -> Option<&'a Role> {
    member
        .role_set()
        .iter()
        .filter_map(|id| roles.get(id))
        .fold(None, |best: Option<&Role>, role| match best {
            Some(current) if !role.is_higher_than(current) => Some(current),
            _ => Some(role),
        })
}
