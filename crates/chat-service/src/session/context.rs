//! Session context - dependency container for one guild session
//!
//! Created when a guild is activated and dropped with its [`Session`].
//! Nothing in here is process-global, so several sessions can run side by
//! side.
//!
//! [`Session`]: super::Session

use std::sync::Arc;

use chat_api::HttpApiClient;
use chat_common::{ClientConfig, ClientResult};
use chat_core::{ApiClient, ProvisionalIds, Snowflake};
use chat_gateway::{Transport, WebSocketTransport};

/// Everything a session needs from the outside world
///
/// Provides access to:
/// - the client configuration
/// - the REST collaborator
/// - the real-time transport
/// - the provisional id generator for optimistic inserts
#[derive(Clone)]
pub struct SessionContext {
    config: Arc<ClientConfig>,
    api: Arc<dyn ApiClient>,
    transport: Arc<dyn Transport>,
    provisional_ids: Arc<ProvisionalIds>,
}

impl SessionContext {
    /// Create a context from explicit collaborators
    pub fn new(config: ClientConfig, api: Arc<dyn ApiClient>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            api,
            transport,
            provisional_ids: Arc::new(ProvisionalIds::new()),
        }
    }

    /// Create a context talking HTTP and WebSocket to the configured server
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let api = HttpApiClient::new(&config.api, config.guild_id)?;
        let transport = WebSocketTransport::new(config.gateway.url.clone());
        Ok(Self::new(config, Arc::new(api), Arc::new(transport)))
    }

    // === Configuration ===

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn guild_id(&self) -> Snowflake {
        self.config.guild_id
    }

    // === Collaborators ===

    /// Get the REST collaborator
    pub fn api(&self) -> Arc<dyn ApiClient> {
        self.api.clone()
    }

    /// Get the real-time transport
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    // === Ids ===

    /// Next provisional id for a pending message
    pub fn next_provisional_id(&self) -> Snowflake {
        self.provisional_ids.next_id()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("guild_id", &self.config.guild_id)
            .field("gateway", &self.config.gateway.url)
            .field("api", &self.config.api.base_url)
            .finish()
    }
}
