//! # chat-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    ApiConfig, AppSettings, BackoffConfig, ClientConfig, ConfigError, Environment, GatewayConfig,
    LimitsConfig, PresenceConfig, MAX_HISTORY_PAGE_SIZE,
};
pub use error::{ClientError, ClientResult, ErrorKind};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
