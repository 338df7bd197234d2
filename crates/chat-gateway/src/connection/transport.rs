//! Transport seam between the connection manager and the socket

use async_trait::async_trait;

/// A frame received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer closed the connection with an optional close code
    Close(Option<u16>),
}

/// Error type for transport operations
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),
}

/// Opens links to the server
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn Link>, TransportError>;
}

/// One open, ordered, bidirectional text channel
#[async_trait]
pub trait Link: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next frame; `None` once the peer is gone. Must be cancel safe.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    async fn close(&mut self);
}
