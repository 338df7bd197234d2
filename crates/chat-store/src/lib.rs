//! # chat-store
//!
//! Authoritative in-memory state of one session and the reconciler that
//! folds optimistic local mutations and server events into it.

pub mod reconciler;
pub mod store;

pub use reconciler::{merge, Applied, InboundEvent, MergeScope, Mutation, PageKind, Rollback};
pub use store::{Now, Store, Timeline};
