//! # chat-presence
//!
//! Ephemeral, time-bounded session state.
//!
//! ## Features
//!
//! - **Typing**: per-channel typing indicators with lazy TTL expiry
//! - **Rosters**: voice participants and channel viewers (set semantics)
//! - **Timeout**: the local user's mute expiry
//!
//! Nothing here reads a clock; callers pass `now` explicitly.

pub mod roster;
pub mod store;
pub mod timeout;
pub mod typing;

pub use roster::{Roster, RosterMember};
pub use store::PresenceStore;
pub use timeout::TimeoutState;
pub use typing::{TypingTracker, TypingUser, TYPING_TTL};
