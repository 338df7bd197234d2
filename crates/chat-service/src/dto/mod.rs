//! Data Transfer Objects
//!
//! Validated inputs of the session operations.

mod requests;

pub use requests::*;
