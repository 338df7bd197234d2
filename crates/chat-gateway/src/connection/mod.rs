//! Gateway connection lifecycle

mod handshake;
mod manager;
pub mod memory;
mod state;
mod transport;
mod websocket;

pub use handshake::{handshake, HandshakeError, Identity, Ready};
pub use manager::{ConnectionEvent, ConnectionManager, ConnectionOptions};
pub use state::{Backoff, ConnectionState, ConnectionStatus};
pub use transport::{Frame, Link, Transport, TransportError};
pub use websocket::WebSocketTransport;
