//! Channel permission overrides

use std::collections::BTreeMap;

use crate::value_objects::{Permissions, Snowflake};

/// Who a channel override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverrideTarget {
    Role(Snowflake),
    Member(Snowflake),
}

impl OverrideTarget {
    /// Raw id of the role or member
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Role(id) | Self::Member(id) => *id,
        }
    }
}

/// Channel-scoped allow/deny exception for one role or member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOverride {
    pub channel_id: Snowflake,
    pub target: OverrideTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl ChannelOverride {
    /// Create an override; a bit present in both masks is kept only in `deny`
    pub fn new(
        channel_id: Snowflake,
        target: OverrideTarget,
        allow: Permissions,
        deny: Permissions,
    ) -> Self {
        Self {
            channel_id,
            target,
            allow: allow & !deny,
            deny,
        }
    }

    /// Apply this override on top of `base`
    #[inline]
    pub fn apply(&self, base: Permissions) -> Permissions {
        base.apply_override(self.allow, self.deny)
    }
}

/// All overrides of one channel, at most one per target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<OverrideTarget, ChannelOverride>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override, replacing any previous one for the same target
    pub fn upsert(&mut self, entry: ChannelOverride) -> Option<ChannelOverride> {
        self.entries.insert(entry.target, entry)
    }

    pub fn remove(&mut self, target: OverrideTarget) -> Option<ChannelOverride> {
        self.entries.remove(&target)
    }

    pub fn get(&self, target: OverrideTarget) -> Option<&ChannelOverride> {
        self.entries.get(&target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelOverride> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ChannelOverride> for OverrideTable {
    fn from_iter<I: IntoIterator<Item = ChannelOverride>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.upsert(entry);
        }
        table
    }
}
