//! Permission algebra - pure functions over roles and channel overrides

mod compute;
mod snapshot;

pub use compute::{base_permissions, effective_permissions, highest_role};
pub use snapshot::PermissionSnapshot;
