//! Connection manager
//!
//! Owns the single gateway connection of a session: connects, identifies,
//! forwards server events and reconnects with backoff until shut down.

use std::sync::Arc;
use std::time::Duration;

use chat_common::{BackoffConfig, ClientConfig, ClientError, ClientResult};
use chat_core::Snowflake;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::handshake::{handshake, HandshakeError, Identity};
use super::state::{Backoff, ConnectionState, ConnectionStatus};
use super::transport::{Frame, Link, Transport};
use crate::protocol::{is_fatal_close, ClientEvent, ServerEvent};

/// Channel buffer size for outgoing frames
const OUTBOUND_BUFFER_SIZE: usize = 100;

/// Channel buffer size for events handed to the session
const EVENT_BUFFER_SIZE: usize = 256;

/// What the manager reports to its owner
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Handshake completed; `resumed` is set on every reconnect after the first
    Connected {
        resumed: bool,
        user_id: Snowflake,
        user_name: String,
    },
    /// An established connection was lost; a reconnect is scheduled
    Disconnected { reason: String },
    /// Decoded server event
    Event(ServerEvent),
    /// Credentials were rejected; the manager has stopped
    AuthFailed { reason: String },
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub identity: Identity,
    pub handshake_timeout: Duration,
    pub backoff: BackoffConfig,
}

impl ConnectionOptions {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            identity: Identity {
                token: config.api.token.clone(),
                guild_id: config.guild_id,
            },
            handshake_timeout: config.gateway.handshake_timeout(),
            backoff: config.backoff,
        }
    }
}

/// State shared between the handle and the background task
struct Shared {
    status: watch::Sender<ConnectionStatus>,
    /// Present only while connected
    outbound: Mutex<Option<mpsc::Sender<String>>>,
}

impl Shared {
    fn open(&self, sender: mpsc::Sender<String>) {
        *self.outbound.lock() = Some(sender);
        self.status
            .send_replace(ConnectionStatus::new(ConnectionState::Connected, 0));
    }

    fn set_down(&self, status: ConnectionStatus) {
        self.outbound.lock().take();
        self.status.send_replace(status);
    }

    /// Stopped for good; the attempt count is kept
    fn stop(&self) {
        self.outbound.lock().take();
        self.status.send_modify(|status| {
            status.state = ConnectionState::Disconnected;
            status.next_retry = None;
        });
    }
}

/// How one link ended
enum LinkEnd {
    /// Never reached `ready`
    Failed(String),
    /// Was connected, then lost
    Lost(String),
    /// Credentials rejected
    Fatal(String),
    /// Owner dropped the event receiver
    Abandoned,
    /// Shutdown requested
    Shutdown,
}

/// Handle to the background connection task
pub struct ConnectionManager {
    shared: Arc<Shared>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawn the connection task
    ///
    /// Returns the handle and the receiver for [`ConnectionEvent`]s.
    pub fn start(
        transport: Arc<dyn Transport>,
        options: ConnectionOptions,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        let shared = Arc::new(Shared {
            status: status_tx,
            outbound: Mutex::new(None),
        });
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(Self::run(
            transport,
            options,
            shared.clone(),
            event_tx,
            shutdown_rx,
        ));

        let manager = Self {
            shared,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };
        (manager, event_rx)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.status.borrow().state
    }

    /// Current state with the reconnect schedule
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Receiver that observes every status change
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Send an event to the server
    ///
    /// Fails immediately unless connected; nothing is queued for later.
    pub fn send(&self, event: &ClientEvent) -> ClientResult<()> {
        let guard = self.shared.outbound.lock();
        let Some(sender) = guard.as_ref() else {
            return Err(ClientError::connection("not connected"));
        };

        let text = event.to_json().map_err(ClientError::protocol)?;
        sender.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ClientError::connection("outbound buffer full"),
            mpsc::error::TrySendError::Closed(_) => ClientError::connection("not connected"),
        })?;

        tracing::trace!(event_type = event.event_type(), "Event queued");
        Ok(())
    }

    /// Stop the task, closing the link and cancelling any pending reconnect
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Connection task ended abnormally");
            }
        }
        self.shared.stop();
    }

    async fn run(
        transport: Arc<dyn Transport>,
        options: ConnectionOptions,
        shared: Arc<Shared>,
        events: mpsc::Sender<ConnectionEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut backoff = Backoff::new(options.backoff);
        let mut ever_connected = false;

        loop {
            shared.set_down(ConnectionStatus::new(
                ConnectionState::Connecting,
                backoff.attempts(),
            ));

            let end = Self::run_link(
                transport.as_ref(),
                &options,
                &shared,
                &events,
                &mut backoff,
                &mut ever_connected,
                &mut shutdown,
            )
            .await;

            shared.set_down(ConnectionStatus::new(
                ConnectionState::Disconnected,
                backoff.attempts(),
            ));

            match end {
                LinkEnd::Failed(reason) => {
                    tracing::warn!(reason = %reason, attempt = backoff.attempts(), "Connect attempt failed");
                }
                LinkEnd::Lost(reason) => {
                    tracing::warn!(reason = %reason, "Connection lost");
                    if events
                        .send(ConnectionEvent::Disconnected { reason })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                LinkEnd::Fatal(reason) => {
                    tracing::error!(reason = %reason, "Authentication failed, not reconnecting");
                    let _ = events.send(ConnectionEvent::AuthFailed { reason }).await;
                    break;
                }
                LinkEnd::Abandoned | LinkEnd::Shutdown => break,
            }

            let delay = backoff.next_delay();
            shared.set_down(ConnectionStatus::retrying(
                backoff.attempts(),
                tokio::time::Instant::now() + delay,
            ));
            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                attempt = backoff.attempts(),
                "Reconnecting after delay"
            );

            tokio::select! {
                _ = &mut shutdown => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        shared.stop();
        tracing::info!("Connection task stopped");
    }

    /// Connect, identify and pump frames until the link ends
    async fn run_link(
        transport: &dyn Transport,
        options: &ConnectionOptions,
        shared: &Shared,
        events: &mpsc::Sender<ConnectionEvent>,
        backoff: &mut Backoff,
        ever_connected: &mut bool,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> LinkEnd {
        let connect = tokio::select! {
            _ = &mut *shutdown => return LinkEnd::Shutdown,
            connect = transport.connect() => connect,
        };
        let mut link = match connect {
            Ok(link) => link,
            Err(e) => return LinkEnd::Failed(e.to_string()),
        };

        let outcome = tokio::select! {
            _ = &mut *shutdown => {
                link.close().await;
                return LinkEnd::Shutdown;
            }
            outcome = tokio::time::timeout(
                options.handshake_timeout,
                handshake(link.as_mut(), &options.identity),
            ) => outcome,
        };
        let ready = match outcome {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) if e.is_fatal() => return LinkEnd::Fatal(e.to_string()),
            Ok(Err(e)) => return LinkEnd::Failed(e.to_string()),
            Err(_) => {
                link.close().await;
                return LinkEnd::Failed(HandshakeError::Timeout.to_string());
            }
        };

        backoff.reset();
        let resumed = std::mem::replace(ever_connected, true);
        let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        shared.open(outbound_tx);

        tracing::info!(user_id = %ready.user_id, resumed, "Gateway connected");

        let connected = ConnectionEvent::Connected {
            resumed,
            user_id: ready.user_id,
            user_name: ready.user_name,
        };
        if events.send(connected).await.is_err() {
            return LinkEnd::Abandoned;
        }

        Self::pump(link.as_mut(), &mut outbound_rx, events, shutdown).await
    }

    async fn pump(
        link: &mut dyn Link,
        outbound: &mut mpsc::Receiver<String>,
        events: &mpsc::Sender<ConnectionEvent>,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> LinkEnd {
        loop {
            tokio::select! {
                _ = &mut *shutdown => {
                    // Flush what the owner queued before asking to stop
                    outbound.close();
                    while let Some(text) = outbound.recv().await {
                        if link.send(text).await.is_err() {
                            break;
                        }
                    }
                    link.close().await;
                    return LinkEnd::Shutdown;
                }

                Some(text) = outbound.recv() => {
                    if let Err(e) = link.send(text).await {
                        return LinkEnd::Lost(e.to_string());
                    }
                }

                frame = link.recv() => {
                    let text = match frame {
                        Some(Ok(Frame::Text(text))) => text,
                        Some(Ok(Frame::Close(code))) if is_fatal_close(code) => {
                            return LinkEnd::Fatal(format!("closed with code {code:?}"));
                        }
                        Some(Ok(Frame::Close(code))) => {
                            return LinkEnd::Lost(format!("closed by server (code {code:?})"));
                        }
                        Some(Err(e)) => return LinkEnd::Lost(e.to_string()),
                        None => return LinkEnd::Lost("stream ended".to_string()),
                    };

                    match ServerEvent::from_json(&text) {
                        Ok(event) => {
                            if events.send(ConnectionEvent::Event(event)).await.is_err() {
                                return LinkEnd::Abandoned;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Undecodable server frame dropped");
                        }
                    }
                }
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
