//! Reconciler - the two entry points that mutate the store
//!
//! Local intent goes through [`crate::Store::apply_optimistic`], server
//! events through [`crate::Store::apply_inbound`] and
//! [`crate::Store::merge_page`]. Conflicts are resolved server-wins by [`merge`].

mod inbound;
mod resolve;
mod mutation;

pub use inbound::{InboundEvent, PageKind};
pub use resolve::{merge, MergeScope};
pub use mutation::{Applied, Mutation, Rollback};
