//! Gateway wire protocol
//!
//! JSON text frames tagged by `type`, one connection per server.

mod client_event;
mod close_codes;
mod payloads;
mod server_event;
mod signal;

pub use client_event::ClientEvent;
pub use close_codes::{is_fatal_close, CloseCode};
pub use payloads::{MessagePayload, ReactionPayload, ReplyPayload};
pub use server_event::ServerEvent;
pub use signal::{Signal, SignalKind};
