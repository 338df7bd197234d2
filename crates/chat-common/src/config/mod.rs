//! Configuration structs

mod client_config;

pub use client_config::{
    ApiConfig, AppSettings, BackoffConfig, ClientConfig, ConfigError, Environment, GatewayConfig,
    LimitsConfig, PresenceConfig, MAX_HISTORY_PAGE_SIZE,
};
