//! Permission bitflags for role and channel scoped access control
//!
//! Each capability is one bit of a 64-bit integer. Bit positions are part of
//! the stored role data and must never be renumbered.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Capability flags
    ///
    /// Serialized as a decimal string in JSON for JavaScript safety.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        /// View channel and read messages
        const VIEW_CHANNEL      = 1 << 0;
        /// Send messages in text channels
        const SEND_MESSAGES     = 1 << 1;
        /// Delete or pin other users' messages
        const MANAGE_MESSAGES   = 1 << 2;
        /// Create, edit, delete channels and their overrides
        const MANAGE_CHANNELS   = 1 << 3;
        /// Create, edit, delete, assign roles
        const MANAGE_ROLES      = 1 << 4;
        /// Edit guild settings
        const MANAGE_GUILD      = 1 << 5;
        /// Kick members from guild
        const KICK_MEMBERS      = 1 << 6;
        /// Ban members from guild
        const BAN_MEMBERS       = 1 << 7;
        /// Bypass all permission checks
        const ADMINISTRATOR     = 1 << 8;
        /// Upload files and images
        const ATTACH_FILES      = 1 << 9;
        /// Add emoji reactions
        const ADD_REACTIONS     = 1 << 10;
        /// Join voice channels
        const CONNECT           = 1 << 11;
        /// Transmit audio in voice channels
        const SPEAK             = 1 << 12;
        /// Put members in timeout
        const MODERATE_MEMBERS  = 1 << 13;
        /// Pin and unpin messages
        const PIN_MESSAGES      = 1 << 14;

        /// Default permissions for the everyone role
        const DEFAULT = Self::VIEW_CHANNEL.bits()
            | Self::SEND_MESSAGES.bits()
            | Self::ADD_REACTIONS.bits()
            | Self::ATTACH_FILES.bits()
            | Self::CONNECT.bits()
            | Self::SPEAK.bits();

        /// All permissions
        const ALL = u64::MAX;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Check if the permission set has any of the given permissions
    #[inline]
    pub fn has_any(&self, permissions: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.intersects(permissions)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Apply one override tier: deny is cleared first, then allow is set
    #[inline]
    #[must_use]
    pub fn apply_override(self, allow: Permissions, deny: Permissions) -> Self {
        (self & !deny) | allow
    }

    /// Build from raw bits, keeping bits that have no name yet
    #[inline]
    pub const fn from_raw(bits: u64) -> Self {
        Permissions::from_bits_retain(bits)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_retain)
    }

    /// Names of all individually set, named permissions
    pub fn list(&self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(name, _)| *name != "DEFAULT" && *name != "ALL")
            .map(|(name, _)| name)
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Accepts a decimal string or a bare integer
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Permissions::parse(value).map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_retain(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(perms: Permissions) -> Self {
        perms.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permissions() {
        let default = Permissions::DEFAULT;
        assert!(default.contains(Permissions::VIEW_CHANNEL));
        assert!(default.contains(Permissions::SEND_MESSAGES));
        assert!(default.contains(Permissions::CONNECT));
        assert!(!default.contains(Permissions::ADMINISTRATOR));
        assert!(!default.contains(Permissions::MODERATE_MEMBERS));
    }

    #[test]
    fn test_administrator_bypasses_every_named_bit() {
        let admin = Permissions::ADMINISTRATOR;
        for (_, flag) in Permissions::all().iter_names() {
            assert!(admin.has(flag));
        }
        assert!(admin.has(Permissions::from_raw(1 << 40)));
    }

    #[test]
    fn test_has_permission() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert!(perms.has(Permissions::VIEW_CHANNEL));
        assert!(perms.has(Permissions::SEND_MESSAGES));
        assert!(!perms.has(Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_has_any() {
        let perms = Permissions::VIEW_CHANNEL;
        let check = Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD;
        assert!(perms.has_any(check));
        assert!(!Permissions::SEND_MESSAGES.has_any(check));
    }

    #[test]
    fn test_apply_override_deny_before_allow() {
        let base = Permissions::from_raw(0b1001);
        let bit0 = Permissions::from_raw(1);
        let denied = base.apply_override(Permissions::empty(), bit0);
        assert_eq!(denied.bits(), 0b1000);
        assert_eq!(denied.apply_override(bit0, Permissions::empty()).bits(), 0b1001);
    }

    #[test]
    fn test_combine_permissions() {
        let combined = Permissions::combine([
            Permissions::VIEW_CHANNEL,
            Permissions::SEND_MESSAGES,
            Permissions::MANAGE_GUILD,
        ]);
        assert!(combined.contains(Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_serialize_json() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert_eq!(serde_json::to_string(&perms).unwrap(), "\"3\"");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        let from_str: Permissions = serde_json::from_str("\"3\"").unwrap();
        let from_num: Permissions = serde_json::from_str("3").unwrap();
        assert_eq!(from_str, from_num);
        assert!(from_str.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_unknown_bits_are_retained() {
        let perms: Permissions = serde_json::from_str("\"1099511627776\"").unwrap();
        assert_eq!(perms.bits(), 1 << 40);
    }

    #[test]
    fn test_list_permissions() {
        let list = (Permissions::VIEW_CHANNEL | Permissions::ADMINISTRATOR).list();
        assert_eq!(list, vec!["VIEW_CHANNEL", "ADMINISTRATOR"]);
    }

    #[test]
    fn test_bit_positions_are_stable() {
        assert_eq!(Permissions::VIEW_CHANNEL.bits(), 1 << 0);
        assert_eq!(Permissions::SEND_MESSAGES.bits(), 1 << 1);
        assert_eq!(Permissions::MANAGE_MESSAGES.bits(), 1 << 2);
        assert_eq!(Permissions::MANAGE_CHANNELS.bits(), 1 << 3);
        assert_eq!(Permissions::MANAGE_ROLES.bits(), 1 << 4);
        assert_eq!(Permissions::MANAGE_GUILD.bits(), 1 << 5);
        assert_eq!(Permissions::KICK_MEMBERS.bits(), 1 << 6);
        assert_eq!(Permissions::BAN_MEMBERS.bits(), 1 << 7);
        assert_eq!(Permissions::ADMINISTRATOR.bits(), 1 << 8);
        assert_eq!(Permissions::ATTACH_FILES.bits(), 1 << 9);
        assert_eq!(Permissions::ADD_REACTIONS.bits(), 1 << 10);
        assert_eq!(Permissions::CONNECT.bits(), 1 << 11);
        assert_eq!(Permissions::SPEAK.bits(), 1 << 12);
        assert_eq!(Permissions::MODERATE_MEMBERS.bits(), 1 << 13);
        assert_eq!(Permissions::PIN_MESSAGES.bits(), 1 << 14);
    }
}
