//! HTTP implementation of the REST collaborator

use async_trait::async_trait;
use chat_common::ApiConfig;
use chat_core::{
    ApiClient, ApiResult, ChannelOverride, DomainError, Member, Message, MessageQuery,
    OverrideTarget, Role, Snowflake,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use validator::Validate;

use crate::dto::{HistoryQuery, MemberDto, MessageDto, OverrideDto};
use crate::response::{self, error_from_reqwest};

/// Header scoping every request to one guild
pub const GUILD_HEADER: &str = "x-guild-id";

const USER_AGENT: &str = concat!("chat-client/", env!("CARGO_PKG_VERSION"));

/// REST client bound to one guild and one bearer token
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: Client,
    base_url: String,
    guild_id: Snowflake,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig, guild_id: Snowflake) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| DomainError::ValidationError("token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let guild = HeaderValue::from_str(&guild_id.to_string())
            .map_err(|e| DomainError::InternalError(e.to_string()))?;
        headers.insert(GUILD_HEADER, guild);

        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| DomainError::InternalError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            guild_id,
        })
    }

    #[must_use]
    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| error_from_reqwest(&e))?;
        response::json(resp).await
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn fetch_roles(&self) -> ApiResult<Vec<Role>> {
        self.get("/roles").await
    }

    async fn fetch_member(&self, user_id: Snowflake) -> ApiResult<Member> {
        let dto: MemberDto = self.get(&format!("/members/{user_id}")).await?;
        Ok(dto.into_member(self.guild_id))
    }

    async fn fetch_overrides(&self, channel_id: Snowflake) -> ApiResult<Vec<ChannelOverride>> {
        let dtos: Vec<OverrideDto> = self.get(&format!("/channels/{channel_id}/overrides")).await?;
        Ok(dtos
            .into_iter()
            .map(|dto| dto.into_override(channel_id))
            .collect())
    }

    async fn put_override(&self, entry: &ChannelOverride) -> ApiResult<()> {
        let body = OverrideDto::from_override(entry);
        body.validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let path = format!(
            "/channels/{}/overrides/{}",
            entry.channel_id,
            entry.target.id()
        );
        let resp = self
            .http
            .put(self.url(&path))
            .json(&body)
            .send()
            .await
            .map_err(|e| error_from_reqwest(&e))?;
        response::check(resp).await?;

        tracing::debug!(channel_id = %entry.channel_id, target = %entry.target.id(), "Override saved");
        Ok(())
    }

    async fn delete_override(&self, channel_id: Snowflake, target: OverrideTarget) -> ApiResult<()> {
        let path = format!("/channels/{channel_id}/overrides/{}", target.id());
        let resp = self
            .http
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| error_from_reqwest(&e))?;
        response::check(resp).await?;
        Ok(())
    }

    async fn fetch_messages(&self, channel_id: Snowflake, query: MessageQuery) -> ApiResult<Vec<Message>> {
        let query = HistoryQuery::from(query);
        query
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let resp = self
            .http
            .get(self.url(&format!("/channels/{channel_id}/messages")))
            .query(&query)
            .send()
            .await
            .map_err(|e| error_from_reqwest(&e))?;
        let page: Vec<MessageDto> = response::json(resp).await?;

        let mut messages: Vec<Message> = page.into_iter().map(Message::from).collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }
}
