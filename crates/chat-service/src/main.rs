//! Headless chat client
//!
//! Activates a guild session, optionally opens a channel and logs every
//! update until interrupted.
//!
//! Run with:
//! ```bash
//! cargo run -p chat-service -- [channel_id]
//! ```
//!
//! Configuration is loaded from environment variables or a `.env` file.

use chat_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use chat_core::Snowflake;
use chat_service::{Session, SessionContext, Update};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Client stopped");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let channel_id = std::env::args()
        .nth(1)
        .map(|arg| Snowflake::parse(&arg))
        .transpose()?;

    info!(
        env = ?config.app.env,
        guild_id = %config.guild_id,
        gateway = %config.gateway.url,
        "Configuration loaded"
    );

    let ctx = SessionContext::from_config(config)?;
    let mut session = Session::activate(ctx).await?;

    if let Some(channel_id) = channel_id {
        let events = session.open_channel(channel_id).await?;
        info!(channel_id = %channel_id, events = events.len(), "Channel opened");
    }

    let mut status = session.watch_status();
    loop {
        tokio::select! {
            update = session.next_update() => match update {
                Some(update) => log_update(&session, &update),
                None => break,
            },
            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                if current.next_retry.is_some() {
                    info!(status = %current, "Reconnect scheduled");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.deactivate().await;
    Ok(())
}

fn log_update(session: &Session, update: &Update) {
    match update {
        Update::Store(events) => {
            for event in events {
                info!(
                    event_type = event.event_type(),
                    channel_id = ?event.channel_id(),
                    "Store changed"
                );
            }
        }
        Update::Connected { resumed } => info!(resumed, state = %session.connection_state(), "Connected"),
        Update::Disconnected { reason, events } => {
            warn!(reason = %reason, cleared = events.len(), "Disconnected");
        }
        Update::AuthFailed { reason } => error!(reason = %reason, "Authentication rejected"),
        Update::Signal(signal) => info!(
            kind = %signal.kind,
            from = %signal.from_user_id,
            channel_id = %signal.channel_id,
            "Signal received"
        ),
        Update::Notice(message) => warn!(message = %message, "Notice"),
    }
}
