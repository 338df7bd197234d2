//! In-memory collaborators for session tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chat_common::ClientConfig;
use chat_core::{
    ApiClient, ApiResult, ChannelOverride, Member, Message, MessageQuery, OverrideTarget,
    Permissions, Role, Snowflake,
};
use chat_gateway::connection::memory::{self, MemoryServer, ServerEnd};
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use super::{Session, SessionContext};

pub(crate) const GUILD: Snowflake = Snowflake::new(100);
pub(crate) const ME: Snowflake = Snowflake::new(1);
pub(crate) const OTHER: Snowflake = Snowflake::new(2);
pub(crate) const CHANNEL: Snowflake = Snowflake::new(10);

type History = Arc<Mutex<Vec<Message>>>;

/// Confirmed message whose timestamps follow its id
pub(crate) fn message(id: i64, author_id: Snowflake, content: &str) -> Message {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Message::new(
        Snowflake::new(id),
        CHANNEL,
        author_id,
        if author_id == ME { "me" } else { "bob" },
        content,
        base + Duration::seconds(id),
    )
}

/// Holds history fetches of one channel until released
#[derive(Clone)]
pub(crate) struct FetchGate {
    channel: Arc<Mutex<Option<Snowflake>>>,
    reached: Arc<Notify>,
    release: Arc<Semaphore>,
}

impl Default for FetchGate {
    fn default() -> Self {
        Self {
            channel: Arc::default(),
            reached: Arc::new(Notify::new()),
            release: Arc::new(Semaphore::new(0)),
        }
    }
}

impl FetchGate {
    /// Hold the next history fetch of `channel_id`
    pub(crate) fn hold(&self, channel_id: Snowflake) {
        *self.channel.lock() = Some(channel_id);
    }

    /// Wait until a held fetch is parked
    pub(crate) async fn reached(&self) {
        self.reached.notified().await;
    }

    pub(crate) fn release(&self) {
        *self.channel.lock() = None;
        self.release.add_permits(1);
    }

    async fn pass(&self, channel_id: Snowflake) {
        let held = *self.channel.lock() == Some(channel_id);
        if held {
            self.reached.notify_one();
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
        }
    }
}

/// REST fake serving fixed roles, overrides and history
pub(crate) struct FakeApi {
    roles: Vec<Role>,
    member_roles: Vec<Snowflake>,
    overrides: HashMap<Snowflake, Vec<ChannelOverride>>,
    history: HashMap<Snowflake, History>,
    queries: Arc<Mutex<Vec<MessageQuery>>>,
    gate: FetchGate,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            roles: vec![Role::everyone(GUILD, Permissions::DEFAULT)],
            member_roles: Vec::new(),
            overrides: HashMap::new(),
            history: HashMap::new(),
            queries: Arc::default(),
            gate: FetchGate::default(),
        }
    }
}

impl FakeApi {
    pub(crate) fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub(crate) fn with_member_roles(mut self, role_ids: Vec<Snowflake>) -> Self {
        self.member_roles = role_ids;
        self
    }

    pub(crate) fn with_overrides(mut self, channel_id: Snowflake, overrides: Vec<ChannelOverride>) -> Self {
        self.overrides.insert(channel_id, overrides);
        self
    }

    pub(crate) fn with_messages(mut self, channel_id: Snowflake, messages: Vec<Message>) -> Self {
        self.history
            .insert(channel_id, Arc::new(Mutex::new(messages)));
        self
    }

    /// Shared handle to a channel's history, for changes made mid-test
    pub(crate) fn history(&self, channel_id: Snowflake) -> History {
        self.history.get(&channel_id).cloned().unwrap_or_default()
    }

    /// Every history query received, oldest first
    pub(crate) fn queries(&self) -> Arc<Mutex<Vec<MessageQuery>>> {
        self.queries.clone()
    }

    pub(crate) fn gate(&self) -> FetchGate {
        self.gate.clone()
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn fetch_roles(&self) -> ApiResult<Vec<Role>> {
        Ok(self.roles.clone())
    }

    async fn fetch_member(&self, user_id: Snowflake) -> ApiResult<Member> {
        Ok(Member::new(GUILD, user_id).with_roles(self.member_roles.clone()))
    }

    async fn fetch_overrides(&self, channel_id: Snowflake) -> ApiResult<Vec<ChannelOverride>> {
        Ok(self.overrides.get(&channel_id).cloned().unwrap_or_default())
    }

    async fn put_override(&self, _entry: &ChannelOverride) -> ApiResult<()> {
        Ok(())
    }

    async fn delete_override(&self, _channel_id: Snowflake, _target: OverrideTarget) -> ApiResult<()> {
        Ok(())
    }

    async fn fetch_messages(&self, channel_id: Snowflake, query: MessageQuery) -> ApiResult<Vec<Message>> {
        self.queries.lock().push(query);
        self.gate.pass(channel_id).await;

        let Some(history) = self.history.get(&channel_id) else {
            return Ok(Vec::new());
        };
        let mut page: Vec<Message> = history
            .lock()
            .iter()
            .filter(|m| query.before.is_none_or(|before| m.id < before))
            .cloned()
            .collect();
        page.sort_by_key(|m| (m.created_at, m.id));
        let skip = page.len().saturating_sub(query.limit as usize);
        Ok(page.split_off(skip))
    }
}

/// Test configuration pointing nowhere; collaborators are injected
pub(crate) fn config() -> ClientConfig {
    let vars: HashMap<&str, &str> = [
        ("GUILD_ID", "100"),
        ("GATEWAY_URL", "ws://127.0.0.1:1/gateway"),
        ("API_URL", "http://127.0.0.1:1"),
        ("AUTH_TOKEN", "test-token"),
    ]
    .into_iter()
    .collect();
    ClientConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap()
}

/// Activate a session against `api` and an in-memory server
pub(crate) async fn activate(api: FakeApi) -> (Session, ServerEnd, MemoryServer) {
    activate_with(api, |_| {}).await
}

pub(crate) async fn activate_with(
    api: FakeApi,
    configure: impl FnOnce(&mut ClientConfig),
) -> (Session, ServerEnd, MemoryServer) {
    let mut config = config();
    configure(&mut config);

    let (transport, mut server) = memory::pair();
    let ctx = SessionContext::new(config, Arc::new(api), Arc::new(transport));

    let (session, end) = tokio::join!(Session::activate(ctx), server.accept_ready(ME, "me"));
    (session.unwrap(), end.unwrap(), server)
}
