//! # chat-core
//!
//! Domain layer containing identifiers, the permission algebra, entities,
//! store events and the REST collaborator port.
//! This crate has zero dependencies on infrastructure (network, runtime, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod permissions;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelOverride, Delivery, Member, Message, OverrideTable, OverrideTarget, ReactionCount,
    ReactionSet, ReplyRef, Role,
};
pub use error::DomainError;
pub use events::StoreEvent;
pub use permissions::{base_permissions, effective_permissions, highest_role, PermissionSnapshot};
pub use traits::{ApiClient, ApiResult, MessageQuery};
pub use value_objects::{Permissions, ProvisionalIds, Snowflake, SnowflakeParseError};
