//! Test helpers for integration tests
//!
//! [`FakeServer`] plays the remote authority: it serves the REST endpoints
//! the client reads, runs the gateway handshake, echoes sent messages and
//! records every request and client event for assertions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chat_api::{ErrorBody, ErrorDetail, HttpApiClient, MemberDto, MessageDto, OverrideDto, GUILD_HEADER};
use chat_common::ClientConfig;
use chat_core::{Message, Role, Snowflake};
use chat_gateway::protocol::{CloseCode, MessagePayload};
use chat_gateway::{ClientEvent, ServerEvent};
use chat_service::{Session, SessionContext, Update};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::fixtures::{everyone, member, ALICE, BOB, GUILD, TOKEN};

/// How long any single wait in a test may take
pub const WAIT: Duration = Duration::from_secs(5);

/// Close code sent when the fake drops its connections
const SERVICE_RESTART: u16 = 1012;

/// State shared by the REST and gateway handlers
struct Authority {
    token: String,
    guild_id: Snowflake,
    user_id: Snowflake,
    user_name: String,
    roles: Mutex<Vec<Role>>,
    members: Mutex<HashMap<Snowflake, MemberDto>>,
    overrides: Mutex<HashMap<Snowflake, Vec<OverrideDto>>>,
    messages: Mutex<HashMap<Snowflake, Vec<MessageDto>>>,
    requests: Mutex<Vec<String>>,
    failure: Mutex<Option<StatusCode>>,
    next_id: AtomicI64,
    identified: AtomicUsize,
    pushes: broadcast::Sender<ServerEvent>,
    kicks: broadcast::Sender<()>,
    received: mpsc::UnboundedSender<ClientEvent>,
}

type SharedAuthority = Arc<Authority>;

impl Authority {
    /// Record a client event, echoing sent messages back as the server would
    fn receive(&self, event: ClientEvent) {
        if let ClientEvent::SendMessage {
            channel_id,
            content,
            user_id,
            user_name,
            nonce,
            ..
        } = &event
        {
            let dto = MessageDto {
                id: Snowflake::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
                channel_id: *channel_id,
                author_id: *user_id,
                author_name: user_name.clone(),
                content: content.clone(),
                created_at: Utc::now(),
                edited_at: None,
                reply: None,
                reactions: Vec::new(),
                pinned_at: None,
            };
            let message = MessagePayload::from_message(&Message::from(dto.clone()));
            self.messages.lock().entry(*channel_id).or_default().push(dto);

            let _ = self.pushes.send(ServerEvent::NewMessage {
                message,
                nonce: nonce.clone(),
            });
        }

        let _ = self.received.send(event);
    }
}

/// In-process remote authority bound to a random local port
pub struct FakeServer {
    addr: SocketAddr,
    authority: SharedAuthority,
    received: mpsc::UnboundedReceiver<ClientEvent>,
    _handle: JoinHandle<()>,
}

impl FakeServer {
    /// Start a server that accepts [`TOKEN`] for alice in [`GUILD`]
    pub async fn start() -> Result<Self> {
        let (received_tx, received) = mpsc::unbounded_channel();
        let (pushes, _) = broadcast::channel(64);
        let (kicks, _) = broadcast::channel(4);

        let members = [member(ALICE, &[]), member(BOB, &[])]
            .into_iter()
            .map(|m| (m.user_id, m))
            .collect();

        let authority = Arc::new(Authority {
            token: TOKEN.to_string(),
            guild_id: GUILD,
            user_id: ALICE,
            user_name: "alice".to_string(),
            roles: Mutex::new(vec![everyone()]),
            members: Mutex::new(members),
            overrides: Mutex::default(),
            messages: Mutex::default(),
            requests: Mutex::default(),
            failure: Mutex::default(),
            next_id: AtomicI64::new(1_000),
            identified: AtomicUsize::new(0),
            pushes,
            kicks,
            received: received_tx,
        });

        // Bound before spawning, so early connects wait in the backlog
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let app = router(authority.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            authority,
            received,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn gateway_url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }

    /// Client configuration pointing at this server with fast reconnects
    pub fn config(&self) -> Result<ClientConfig> {
        self.config_with_token(TOKEN)
    }

    pub fn config_with_token(&self, token: &str) -> Result<ClientConfig> {
        let vars: HashMap<&str, String> = [
            ("GUILD_ID", GUILD.to_string()),
            ("GATEWAY_URL", self.gateway_url()),
            ("API_URL", self.base_url()),
            ("AUTH_TOKEN", token.to_string()),
            ("API_REQUEST_TIMEOUT_SECS", "5".to_string()),
            ("GATEWAY_HANDSHAKE_TIMEOUT_SECS", "5".to_string()),
            ("RECONNECT_MIN_MS", "20".to_string()),
            ("RECONNECT_MAX_MS", "200".to_string()),
        ]
        .into_iter()
        .collect();

        Ok(ClientConfig::from_lookup(|key| vars.get(key).cloned())?)
    }

    /// REST client authenticated with `token`
    pub fn api_client(&self, token: &str) -> Result<HttpApiClient> {
        let config = self.config_with_token(token)?;
        Ok(HttpApiClient::new(&config.api, config.guild_id)?)
    }

    pub fn set_roles(&self, roles: Vec<Role>) {
        *self.authority.roles.lock() = roles;
    }

    pub fn set_member(&self, dto: MemberDto) {
        self.authority.members.lock().insert(dto.user_id, dto);
    }

    pub fn set_overrides(&self, channel_id: Snowflake, overrides: Vec<OverrideDto>) {
        self.authority.overrides.lock().insert(channel_id, overrides);
    }

    pub fn overrides(&self, channel_id: Snowflake) -> Vec<OverrideDto> {
        self.authority
            .overrides
            .lock()
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Add messages to a channel's history without announcing them
    pub fn add_messages(&self, channel_id: Snowflake, messages: Vec<MessageDto>) {
        self.authority
            .messages
            .lock()
            .entry(channel_id)
            .or_default()
            .extend(messages);
    }

    /// Answer the next REST request with `status`
    pub fn fail_next(&self, status: StatusCode) {
        *self.authority.failure.lock() = Some(status);
    }

    /// REST requests received so far, as `METHOD /path?query`
    pub fn requests(&self) -> Vec<String> {
        self.authority.requests.lock().clone()
    }

    /// Number of completed gateway handshakes
    pub fn identified(&self) -> usize {
        self.authority.identified.load(Ordering::SeqCst)
    }

    /// Send an event to every identified connection, returning how many got it
    pub fn push(&self, event: ServerEvent) -> usize {
        self.authority.pushes.send(event).unwrap_or(0)
    }

    /// Close every gateway connection with a non-fatal code
    pub fn kick(&self) -> usize {
        self.authority.kicks.send(()).unwrap_or(0)
    }

    /// Next event a client sent through the gateway
    pub async fn next_client_event(&mut self) -> Result<ClientEvent> {
        tokio::time::timeout(WAIT, self.received.recv())
            .await
            .map_err(|_| anyhow!("no client event within {WAIT:?}"))?
            .ok_or_else(|| anyhow!("server stopped"))
    }

    /// Skip client events until one matches
    pub async fn expect_client_event<F>(&mut self, mut pred: F) -> Result<ClientEvent>
    where
        F: FnMut(&ClientEvent) -> bool,
    {
        loop {
            let event = self.next_client_event().await?;
            if pred(&event) {
                return Ok(event);
            }
        }
    }
}

/// Activate a session for alice against `server`
pub async fn activate(server: &FakeServer) -> Result<Session> {
    let ctx = SessionContext::from_config(server.config()?)?;
    let session = tokio::time::timeout(WAIT, Session::activate(ctx))
        .await
        .map_err(|_| anyhow!("activation did not finish within {WAIT:?}"))??;
    Ok(session)
}

/// Pull updates until one matches
pub async fn wait_for<F>(session: &mut Session, mut pred: F) -> Result<Update>
where
    F: FnMut(&Update) -> bool,
{
    let wait = async {
        while let Some(update) = session.next_update().await {
            if pred(&update) {
                return Ok(update);
            }
        }
        Err(anyhow!("session ended"))
    };

    tokio::time::timeout(WAIT, wait)
        .await
        .map_err(|_| anyhow!("no matching update within {WAIT:?}"))?
}

// ============================================================================
// REST
// ============================================================================

fn router(authority: SharedAuthority) -> Router {
    let api = Router::new()
        .route("/roles", get(list_roles))
        .route("/members/:user_id", get(get_member))
        .route("/channels/:channel_id/overrides", get(list_overrides))
        .route(
            "/channels/:channel_id/overrides/:target_id",
            put(put_override).delete(delete_override),
        )
        .route("/channels/:channel_id/messages", get(list_messages))
        .route_layer(middleware::from_fn_with_state(authority.clone(), authenticate));

    Router::new()
        .route("/gateway", get(gateway))
        .merge(api)
        .with_state(authority)
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

async fn authenticate(State(authority): State<SharedAuthority>, request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
    authority
        .requests
        .lock()
        .push(format!("{} {target}", request.method()));

    let failure = authority.failure.lock().take();
    if let Some(status) = failure {
        return error(status, "INJECTED", "Injected failure");
    }

    let expected = format!("Bearer {}", authority.token);
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if bearer != Some(expected.as_str()) {
        return error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid token");
    }

    let guild = request
        .headers()
        .get(GUILD_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Snowflake::parse(v).ok());
    if guild != Some(authority.guild_id) {
        return error(StatusCode::FORBIDDEN, "UNKNOWN_GUILD", "Not a member of this guild");
    }

    next.run(request).await
}

async fn list_roles(State(authority): State<SharedAuthority>) -> Json<Vec<Role>> {
    Json(authority.roles.lock().clone())
}

async fn get_member(State(authority): State<SharedAuthority>, Path(user_id): Path<i64>) -> Response {
    let found = authority.members.lock().get(&Snowflake::new(user_id)).cloned();
    match found {
        Some(dto) => Json(dto).into_response(),
        None => error(StatusCode::NOT_FOUND, "UNKNOWN_MEMBER", "Unknown member"),
    }
}

async fn list_overrides(
    State(authority): State<SharedAuthority>,
    Path(channel_id): Path<i64>,
) -> Json<Vec<OverrideDto>> {
    let overrides = authority
        .overrides
        .lock()
        .get(&Snowflake::new(channel_id))
        .cloned()
        .unwrap_or_default();
    Json(overrides)
}

async fn put_override(
    State(authority): State<SharedAuthority>,
    Path((channel_id, target_id)): Path<(i64, i64)>,
    Json(body): Json<OverrideDto>,
) -> Response {
    if body.target_id != Snowflake::new(target_id) {
        return error(StatusCode::BAD_REQUEST, "TARGET_MISMATCH", "Body target differs from path");
    }

    let mut overrides = authority.overrides.lock();
    let entries = overrides.entry(Snowflake::new(channel_id)).or_default();
    entries.retain(|o| !(o.target_id == body.target_id && o.kind == body.kind));
    entries.push(body);
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_override(
    State(authority): State<SharedAuthority>,
    Path((channel_id, target_id)): Path<(i64, i64)>,
) -> Response {
    let mut overrides = authority.overrides.lock();
    let entries = overrides.entry(Snowflake::new(channel_id)).or_default();
    let before = entries.len();
    entries.retain(|o| o.target_id != Snowflake::new(target_id));

    if entries.len() == before {
        return error(StatusCode::NOT_FOUND, "UNKNOWN_OVERRIDE", "Unknown override");
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    before: Option<i64>,
    limit: Option<usize>,
}

/// Newest first, like the real API; the client reorders
async fn list_messages(
    State(authority): State<SharedAuthority>,
    Path(channel_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<MessageDto>> {
    let mut page: Vec<MessageDto> = authority
        .messages
        .lock()
        .get(&Snowflake::new(channel_id))
        .map(|messages| {
            messages
                .iter()
                .filter(|m| params.before.is_none_or(|before| m.id.into_inner() < before))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    page.sort_by_key(|m| m.id);
    let skip = page.len().saturating_sub(params.limit.unwrap_or(50));
    let mut page = page.split_off(skip);
    page.reverse();
    Json(page)
}

// ============================================================================
// Gateway
// ============================================================================

async fn gateway(State(authority): State<SharedAuthority>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, authority))
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<()> {
    let text = event.to_json()?;
    socket.send(WsMessage::Text(text)).await?;
    Ok(())
}

async fn close(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    let _ = socket.send(WsMessage::Close(Some(frame))).await;
}

async fn serve_socket(mut socket: WebSocket, authority: SharedAuthority) {
    let identified = match socket.recv().await {
        Some(Ok(WsMessage::Text(text))) => matches!(
            serde_json::from_str::<ClientEvent>(&text),
            Ok(ClientEvent::Identify { token, guild_id })
                if token == authority.token && guild_id == authority.guild_id
        ),
        _ => false,
    };

    if !identified {
        let rejected = ServerEvent::Error {
            message: "Authentication failed".to_string(),
        };
        let _ = send_event(&mut socket, &rejected).await;
        close(&mut socket, CloseCode::AuthenticationFailed.as_u16(), "Authentication failed").await;
        return;
    }

    // Subscribed before ready so nothing pushed after the handshake is lost
    let mut pushes = authority.pushes.subscribe();
    let mut kicks = authority.kicks.subscribe();

    let ready = ServerEvent::Ready {
        user_id: authority.user_id,
        user_name: authority.user_name.clone(),
    };
    if send_event(&mut socket, &ready).await.is_err() {
        return;
    }
    authority.identified.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            frame = socket.recv() => match frame {
                Some(Ok(WsMessage::Text(text))) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => authority.receive(event),
                    Err(_) => {
                        close(&mut socket, CloseCode::DecodeError.as_u16(), "Invalid payload").await;
                        break;
                    }
                },
                Some(Ok(WsMessage::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            pushed = pushes.recv() => match pushed {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = kicks.recv() => {
                close(&mut socket, SERVICE_RESTART, "Restarting").await;
                break;
            }
        }
    }
}
