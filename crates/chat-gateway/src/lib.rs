//! # chat-gateway
//!
//! Client side of the real-time gateway: the JSON wire protocol and the
//! connection manager that keeps one authenticated link alive.

pub mod connection;
pub mod protocol;

pub use connection::{
    ConnectionEvent, ConnectionManager, ConnectionOptions, ConnectionState, ConnectionStatus,
    Identity, Transport, WebSocketTransport,
};
pub use protocol::{ClientEvent, ServerEvent, Signal, SignalKind};
