//! In-memory transport
//!
//! Pairs a client-side [`MemoryTransport`] with a [`MemoryServer`] that
//! accepts each connect as a [`ServerEnd`]. Used to drive the connection
//! manager and session without sockets.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transport::{Frame, Link, Transport, TransportError};
use crate::protocol::{ClientEvent, ServerEvent};

/// Create a connected transport/server pair
#[must_use]
pub fn pair() -> (MemoryTransport, MemoryServer) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    (MemoryTransport { accept_tx }, MemoryServer { accept_rx })
}

/// Client half: every `connect` produces a new link
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    accept_tx: mpsc::UnboundedSender<ServerEnd>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<Box<dyn Link>, TransportError> {
        let (to_client, from_server) = mpsc::unbounded_channel();
        let (to_server, from_client) = mpsc::unbounded_channel();

        self.accept_tx
            .send(ServerEnd {
                to_client,
                from_client,
            })
            .map_err(|_| TransportError::Connect("server is gone".to_string()))?;

        Ok(Box::new(MemoryLink {
            to_server,
            from_server,
        }))
    }
}

struct MemoryLink {
    to_server: mpsc::UnboundedSender<String>,
    from_server: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl Link for MemoryLink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.to_server
            .send(text)
            .map_err(|_| TransportError::Send("peer closed".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.from_server.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.from_server.close();
    }
}

/// Server half: hands out one [`ServerEnd`] per client connect
#[derive(Debug)]
pub struct MemoryServer {
    accept_rx: mpsc::UnboundedReceiver<ServerEnd>,
}

impl MemoryServer {
    /// Wait for the next client connect
    pub async fn accept(&mut self) -> Option<ServerEnd> {
        self.accept_rx.recv().await
    }

    /// Accept a connect, read its `identify` and answer `ready`
    pub async fn accept_ready(&mut self, user_id: chat_core::Snowflake, user_name: &str) -> Option<ServerEnd> {
        let mut end = self.accept().await?;
        match end.recv_event().await? {
            ClientEvent::Identify { .. } => {}
            other => {
                tracing::warn!(event = other.event_type(), "Expected identify");
                return None;
            }
        }
        end.send(&ServerEvent::Ready {
            user_id,
            user_name: user_name.to_string(),
        });
        Some(end)
    }
}

/// Server side of one accepted link; dropping it closes the link
#[derive(Debug)]
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<Frame>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ServerEnd {
    /// Next raw text frame from the client
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next client frame decoded as an event; undecodable frames are skipped
    pub async fn recv_event(&mut self) -> Option<ClientEvent> {
        loop {
            let text = self.recv().await?;
            match serde_json::from_str(&text) {
                Ok(event) => return Some(event),
                Err(e) => tracing::warn!(error = %e, "Undecodable client frame"),
            }
        }
    }

    /// Frame already sent by the client, if any
    pub fn try_recv_event(&mut self) -> Option<ClientEvent> {
        let text = self.from_client.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Send an event; false once the client is gone
    pub fn send(&self, event: &ServerEvent) -> bool {
        match event.to_json() {
            Ok(text) => self.send_text(text),
            Err(_) => false,
        }
    }

    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client.send(Frame::Text(text.into())).is_ok()
    }

    /// Close with a code and drop the link
    pub fn close(self, code: Option<u16>) {
        let _ = self.to_client.send(Frame::Close(code));
    }
}
