//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chat_core::Snowflake;
use serde::Deserialize;

/// Main client configuration, one per activated guild session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub guild_id: Snowflake,
    pub gateway: GatewayConfig,
    pub api: ApiConfig,
    pub presence: PresenceConfig,
    pub backoff: BackoffConfig,
    pub limits: LimitsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Real-time connection settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// WebSocket URL, e.g. `ws://127.0.0.1:8081/gateway`
    pub url: String,
    pub handshake_timeout_secs: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

/// REST collaborator settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token, also presented in the gateway handshake
    pub token: String,
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Typing indicator timings
#[derive(Debug, Clone, Copy)]
pub struct PresenceConfig {
    pub typing_ttl_ms: u64,
    /// How often a continuously typing user re-sends `typing_start`
    pub typing_resend_ms: u64,
    pub sweep_interval_ms: u64,
}

impl PresenceConfig {
    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_millis(self.typing_ttl_ms)
    }

    #[must_use]
    pub fn typing_resend(&self) -> Duration {
        Duration::from_millis(self.typing_resend_ms)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_ttl_ms: default_typing_ttl_ms(),
            typing_resend_ms: default_typing_resend_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Reconnect backoff
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub min_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    /// Fraction of the delay randomly added or removed, 0.0..=1.0
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_ms: default_backoff_min_ms(),
            max_ms: default_backoff_max_ms(),
            multiplier: default_backoff_multiplier(),
            jitter: default_backoff_jitter(),
        }
    }
}

/// Largest history page the REST API serves
pub const MAX_HISTORY_PAGE_SIZE: u32 = 100;

/// Client-side validation limits
#[derive(Debug, Clone, Copy)]
pub struct LimitsConfig {
    pub max_message_length: usize,
    pub history_page_size: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            history_page_size: default_history_page_size(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_typing_ttl_ms() -> u64 {
    10_000
}

fn default_typing_resend_ms() -> u64 {
    8_000
}

fn default_sweep_interval_ms() -> u64 {
    1_000
}

fn default_backoff_min_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_backoff_jitter() -> f64 {
    0.2
}

fn default_max_message_length() -> usize {
    2000
}

fn default_history_page_size() -> u32 {
    50
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required variables are missing or a value does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    /// Same as [`ClientConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_else(default_env),
            },
            guild_id: parse_required(&lookup, "GUILD_ID")?,
            gateway: GatewayConfig {
                url: required("GATEWAY_URL")?,
                handshake_timeout_secs: parse_or(
                    &lookup,
                    "GATEWAY_HANDSHAKE_TIMEOUT_SECS",
                    default_handshake_timeout_secs,
                )?,
            },
            api: ApiConfig {
                base_url: required("API_URL")?,
                token: required("AUTH_TOKEN")?,
                request_timeout_secs: parse_or(
                    &lookup,
                    "API_REQUEST_TIMEOUT_SECS",
                    default_request_timeout_secs,
                )?,
            },
            presence: PresenceConfig {
                typing_ttl_ms: parse_or(&lookup, "TYPING_TTL_MS", default_typing_ttl_ms)?,
                typing_resend_ms: parse_or(&lookup, "TYPING_RESEND_MS", default_typing_resend_ms)?,
                sweep_interval_ms: parse_or(&lookup, "TYPING_SWEEP_MS", default_sweep_interval_ms)?,
            },
            backoff: BackoffConfig {
                min_ms: parse_or(&lookup, "RECONNECT_MIN_MS", default_backoff_min_ms)?,
                max_ms: parse_or(&lookup, "RECONNECT_MAX_MS", default_backoff_max_ms)?,
                multiplier: parse_or(&lookup, "RECONNECT_MULTIPLIER", default_backoff_multiplier)?,
                jitter: parse_or(&lookup, "RECONNECT_JITTER", default_backoff_jitter)?,
            },
            limits: LimitsConfig {
                max_message_length: parse_or(
                    &lookup,
                    "MAX_MESSAGE_LENGTH",
                    default_max_message_length,
                )?,
                history_page_size: parse_or(&lookup, "HISTORY_PAGE_SIZE", default_history_page_size)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the offending variable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.presence.typing_ttl_ms <= self.presence.typing_resend_ms {
            return Err(ConfigError::InvalidValue(
                "TYPING_TTL_MS",
                format!(
                    "{} must exceed TYPING_RESEND_MS ({})",
                    self.presence.typing_ttl_ms, self.presence.typing_resend_ms
                ),
            ));
        }
        if self.backoff.min_ms == 0 || self.backoff.min_ms > self.backoff.max_ms {
            return Err(ConfigError::InvalidValue(
                "RECONNECT_MIN_MS",
                format!("{} must be in 1..={}", self.backoff.min_ms, self.backoff.max_ms),
            ));
        }
        if self.backoff.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue(
                "RECONNECT_MULTIPLIER",
                self.backoff.multiplier.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.backoff.jitter) {
            return Err(ConfigError::InvalidValue(
                "RECONNECT_JITTER",
                self.backoff.jitter.to_string(),
            ));
        }
        if self.presence.sweep_interval_ms == 0
            || self.presence.sweep_interval_ms > self.presence.typing_ttl_ms
        {
            return Err(ConfigError::InvalidValue(
                "TYPING_SWEEP_MS",
                format!(
                    "{} must be in 1..={}",
                    self.presence.sweep_interval_ms, self.presence.typing_ttl_ms
                ),
            ));
        }
        if !(1..=MAX_HISTORY_PAGE_SIZE).contains(&self.limits.history_page_size) {
            return Err(ConfigError::InvalidValue(
                "HISTORY_PAGE_SIZE",
                format!(
                    "{} must be in 1..={MAX_HISTORY_PAGE_SIZE}",
                    self.limits.history_page_size
                ),
            ));
        }
        Ok(())
    }
}

fn parse_required<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key).ok_or(ConfigError::MissingVar(key))?;
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key, raw))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
