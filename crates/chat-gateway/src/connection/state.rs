//! Connection state and reconnect backoff

use std::time::Duration;

use chat_common::BackoffConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No transport; a reconnect may be scheduled
    Disconnected,
    /// Transport opening or handshake in flight
    Connecting,
    /// Handshake completed, events flow both ways
    Connected,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Connection state together with the reconnect schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Failed connect attempts since the last handshake
    pub attempts: u32,
    /// Start of the next reconnect attempt, while one is scheduled
    pub next_retry: Option<Instant>,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn new(state: ConnectionState, attempts: u32) -> Self {
        Self {
            state,
            attempts,
            next_retry: None,
        }
    }

    /// Disconnected with a reconnect due at `at`
    #[must_use]
    pub const fn retrying(attempts: u32, at: Instant) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts,
            next_retry: Some(at),
        }
    }

    /// Time left until the scheduled reconnect
    #[must_use]
    pub fn retry_in(&self, now: Instant) -> Option<Duration> {
        self.next_retry.map(|at| at.saturating_duration_since(now))
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected, 0)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.retry_in(Instant::now()) {
            Some(wait) => write!(
                f,
                "{} (attempt {}, retrying in {}ms)",
                self.state,
                self.attempts,
                wait.as_millis()
            ),
            None => write!(f, "{}", self.state),
        }
    }
}

/// Exponential reconnect delay with random jitter
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Failed attempts since the last successful connect
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next attempt, without jitter
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        let min = self.config.min_ms as f64;
        let max = self.config.max_ms as f64;
        let exponent = i32::try_from(self.attempts).unwrap_or(i32::MAX);
        let ms = (min * self.config.multiplier.powi(exponent)).min(max);
        Duration::from_millis(ms as u64)
    }

    /// Delay before the next attempt; advances the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let base = self.base_delay();
        self.attempts = self.attempts.saturating_add(1);

        let jitter = self.config.jitter;
        if jitter <= 0.0 {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        let ms = (base.as_millis() as f64 * factor).clamp(0.0, self.config.max_ms as f64);
        Duration::from_millis(ms as u64)
    }

    /// Back to the minimum delay
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
