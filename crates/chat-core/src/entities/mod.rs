//! Domain entities - objects held in the local session store

mod member;
mod message;
mod overwrite;
mod reaction;
mod role;

pub use member::Member;
pub use message::{Delivery, Message, ReplyRef};
pub use overwrite::{ChannelOverride, OverrideTable, OverrideTarget};
pub use reaction::{ReactionCount, ReactionSet};
pub use role::Role;
