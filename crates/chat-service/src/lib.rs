//! # chat-service
//!
//! Session facade: one [`Session`] per activated guild, tying the store,
//! the connection manager and the REST collaborator together.

pub mod dto;
pub mod session;

pub use session::{Route, Session, SessionContext, Update};
