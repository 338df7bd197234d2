//! Integration test utilities for the chat client
//!
//! Runs an in-process fake of the remote authority (REST API and gateway)
//! so sessions can be driven end to end over real sockets.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
