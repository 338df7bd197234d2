//! Session facade
//!
//! One [`Session`] per activated guild. It owns the store, the connection
//! manager and the resync task; every store mutation happens on the task
//! that drives [`Session::next_update`] or calls one of the operations.
//!
//! Every mutating operation runs the same steps in order: validate, check
//! the local permission snapshot, check the connection, apply the change
//! optimistically, then emit it. A failed emit rolls the change back.

mod channels;
mod context;
mod messages;
mod presence;
mod route;
mod update;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::time::Instant;

use chat_common::{ClientError, ClientResult};
use chat_core::{DomainError, Permissions, Snowflake, StoreEvent};
use chat_gateway::{
    ClientEvent, ConnectionEvent, ConnectionManager, ConnectionOptions, ConnectionState,
    ConnectionStatus,
};
use chat_presence::PresenceStore;
use chat_store::{Applied, Now, Store};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

pub use context::SessionContext;
pub use route::Route;
pub use update::Update;

use channels::Resynced;

/// Channel buffer size for resync results
const RESYNC_BUFFER_SIZE: usize = 4;

/// Read both clocks once
///
/// The monotonic reading goes through tokio's clock so paused-time tests
/// drive typing TTLs and throttles.
fn now() -> Now {
    Now {
        instant: tokio::time::Instant::now().into_std(),
        wall: Utc::now(),
    }
}

/// Log a stale reference and turn it into an empty change set
fn stale(reference: impl std::fmt::Display) -> Vec<StoreEvent> {
    debug!(reference = %reference, "Stale reference ignored");
    Vec::new()
}

/// Fields of a stored message the operations check before mutating it
#[derive(Debug, Clone, Copy)]
struct Target {
    channel_id: Snowflake,
    author_id: Snowflake,
    pending: bool,
    pinned: bool,
}

/// Live session of one guild
pub struct Session {
    ctx: SessionContext,
    store: Store,
    connection: ConnectionManager,
    events: mpsc::Receiver<ConnectionEvent>,
    user_name: String,
    active_channel: Option<Snowflake>,
    /// Bumped whenever the active channel changes; resync results carry it
    epoch: u64,
    resync: Option<JoinHandle<()>>,
    resync_tx: mpsc::Sender<Resynced>,
    resync_rx: mpsc::Receiver<Resynced>,
    sweep: Interval,
    /// Last `typing_start` sent per channel
    typing_sent: HashMap<Snowflake, Instant>,
}

impl Session {
    /// Connect, wait for the handshake and load the permission snapshot
    ///
    /// Transient connection failures are retried by the connection manager
    /// until the first `ready`. A rejected token fails with
    /// [`ClientError::Auth`].
    #[instrument(skip(ctx), fields(guild_id = %ctx.guild_id()))]
    pub async fn activate(ctx: SessionContext) -> ClientResult<Self> {
        let options = ConnectionOptions::from_config(ctx.config());
        let (connection, mut events) = ConnectionManager::start(ctx.transport(), options);

        let (user_id, user_name) = loop {
            match events.recv().await {
                Some(ConnectionEvent::Connected {
                    user_id, user_name, ..
                }) => break (user_id, user_name),
                Some(ConnectionEvent::AuthFailed { reason }) => return Err(ClientError::Auth(reason)),
                Some(other) => debug!(event = ?other, "Event before activation dropped"),
                None => return Err(ClientError::connection("connection task stopped")),
            }
        };

        let presence = PresenceStore::new(ctx.config().presence.typing_ttl());
        let store = Store::new(ctx.guild_id(), user_id, presence);

        let mut sweep = tokio::time::interval(ctx.config().presence.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let (resync_tx, resync_rx) = mpsc::channel(RESYNC_BUFFER_SIZE);

        let mut session = Self {
            ctx,
            store,
            connection,
            events,
            user_name,
            active_channel: None,
            epoch: 0,
            resync: None,
            resync_tx,
            resync_rx,
            sweep,
            typing_sent: HashMap::new(),
        };
        session.refresh_permissions().await?;

        info!(user_id = %user_id, user_name = %session.user_name, "Session activated");
        Ok(session)
    }

    // === Accessors ===

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn local_user(&self) -> Snowflake {
        self.store.local_user()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn active_channel(&self) -> Option<Snowflake> {
        self.active_channel
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Connection state with the retry counter and next reconnect time
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Receiver that observes every connection status change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.watch_status()
    }

    /// Whether the local snapshot grants `permission`
    ///
    /// `None` asks at guild level; a channel id applies that channel's
    /// overrides.
    pub fn check_permission(&self, channel_id: Option<Snowflake>, permission: Permissions) -> bool {
        self.store.permissions.allows(channel_id, permission)
    }

    // === Event loop ===

    /// Wait for the next change worth reporting
    ///
    /// Dispatches server events into the store, applies resync results and
    /// expires typing indicators. Returns `None` once the connection manager
    /// has stopped (after [`Update::AuthFailed`]).
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            let update = tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.on_connection_event(event),
                    None => return None,
                },
                Some(resynced) = self.resync_rx.recv() => self.on_resynced(resynced),
                _ = self.sweep.tick() => {
                    let events = self.store.sweep_typing(now().instant);
                    (!events.is_empty()).then_some(Update::Store(events))
                }
            };

            if let Some(update) = update {
                return Some(update);
            }
        }
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) -> Option<Update> {
        match event {
            ConnectionEvent::Connected {
                resumed,
                user_id,
                user_name,
            } => {
                self.store.set_local_user(user_id);
                self.user_name = user_name;
                if resumed {
                    self.rejoin();
                    self.start_resync();
                }
                Some(Update::Connected { resumed })
            }

            ConnectionEvent::Disconnected { reason } => {
                self.typing_sent.clear();
                let events = self.store.connection_lost();
                Some(Update::Disconnected { reason, events })
            }

            ConnectionEvent::Event(event) => match Route::from(event) {
                Route::Store(inbound) => {
                    let events = self.store.apply_inbound(inbound, now());
                    (!events.is_empty()).then_some(Update::Store(events))
                }
                Route::Signal(signal) => {
                    if signal.target_user_id == self.store.local_user() {
                        Some(Update::Signal(signal))
                    } else {
                        debug!(kind = %signal.kind, target = %signal.target_user_id, "Signal for another user dropped");
                        None
                    }
                }
                Route::Notice(message) => {
                    warn!(message = %message, "Server reported an error");
                    Some(Update::Notice(message))
                }
                Route::Ignored => None,
            },

            ConnectionEvent::AuthFailed { reason } => {
                warn!(reason = %reason, "Session credentials rejected");
                Some(Update::AuthFailed { reason })
            }
        }
    }

    /// Re-announce the active channel on a fresh link
    fn rejoin(&self) {
        if let Some(channel_id) = self.active_channel {
            if let Err(e) = self.connection.send(&ClientEvent::JoinChannel { channel_id }) {
                warn!(channel_id = %channel_id, error = %e, "Failed to rejoin channel");
            }
        }
    }

    /// Leave the guild: cancel the resync, close the link, drop all state
    #[instrument(skip(self), fields(guild_id = %self.ctx.guild_id()))]
    pub async fn deactivate(mut self) {
        self.epoch += 1;
        self.abort_resync();

        if self.connection.is_connected() {
            let me = self.store.local_user();
            for channel_id in self.store.presence.voice.channels_with(me) {
                let _ = self.connection.send(&ClientEvent::LeaveVoice {
                    channel_id,
                    user_id: me,
                });
            }
            if let Some(channel_id) = self.active_channel {
                let _ = self.connection.send(&ClientEvent::LeaveChannel { channel_id });
            }
        }

        self.connection.shutdown().await;
        self.store.reset();
        self.active_channel = None;
        info!("Session deactivated");
    }

    // === Shared checks ===

    fn require(&self, channel_id: Option<Snowflake>, permission: Permissions) -> ClientResult<()> {
        if self.check_permission(channel_id, permission) {
            Ok(())
        } else {
            Err(DomainError::MissingPermission(permission).into())
        }
    }

    fn require_connected(&self) -> ClientResult<()> {
        if self.connection.is_connected() {
            Ok(())
        } else {
            Err(ClientError::connection(format!(
                "connection is {}",
                self.connection.state()
            )))
        }
    }

    fn require_unmuted(&mut self, now: Now) -> ClientResult<()> {
        if self.store.is_muted(now.wall) {
            let until = self.store.presence.timeout.until().unwrap_or(now.wall);
            return Err(DomainError::Muted(until).into());
        }
        Ok(())
    }

    fn target(&self, message_id: Snowflake) -> Option<Target> {
        self.store.message(message_id).map(|m| Target {
            channel_id: m.channel_id,
            author_id: m.author_id,
            pending: m.is_pending(),
            pinned: m.is_pinned(),
        })
    }

    /// Emit the event for an applied mutation, undoing it if the emit fails
    fn commit(&mut self, applied: Applied, event: &ClientEvent) -> ClientResult<Vec<StoreEvent>> {
        match self.connection.send(event) {
            Ok(()) => Ok(applied.events),
            Err(e) => {
                let undone = self.store.rollback(applied.rollback);
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    undone = undone.len(),
                    "Emit failed, optimistic change rolled back"
                );
                Err(e)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.abort_resync();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("guild_id", &self.ctx.guild_id())
            .field("user_id", &self.store.local_user())
            .field("active_channel", &self.active_channel)
            .field("state", &self.connection.state())
            .finish()
    }
}
