//! Channel lifecycle, history paging and permission resync

use std::sync::Arc;

use chat_common::{ClientError, ClientResult};
use chat_core::{
    ApiClient, ChannelOverride, Member, Message, MessageQuery, Permissions, Role, Snowflake,
    StoreEvent,
};
use chat_gateway::ClientEvent;
use chat_store::{PageKind, Timeline};
use tracing::{debug, info, instrument, warn};

use super::{Session, Update};

/// Everything re-fetched after a reconnect
#[derive(Debug)]
pub(super) struct ResyncData {
    roles: Vec<Role>,
    member: Member,
    /// Overrides and latest page of the active channel
    channel: Option<(Snowflake, Vec<ChannelOverride>, Vec<Message>)>,
}

/// Result of a resync task, tagged with the epoch it was started in
#[derive(Debug)]
pub(super) struct Resynced {
    epoch: u64,
    result: ClientResult<ResyncData>,
}

async fn fetch_resync(
    api: Arc<dyn ApiClient>,
    user_id: Snowflake,
    channel_id: Option<Snowflake>,
    limit: u32,
) -> ClientResult<ResyncData> {
    let roles = api.fetch_roles().await?;
    let member = api.fetch_member(user_id).await?;
    let channel = match channel_id {
        Some(channel_id) => {
            let overrides = api.fetch_overrides(channel_id).await?;
            let page = api
                .fetch_messages(channel_id, MessageQuery::latest(limit))
                .await?;
            Some((channel_id, overrides, page))
        }
        None => None,
    };
    Ok(ResyncData {
        roles,
        member,
        channel,
    })
}

impl Session {
    /// Make `channel_id` the active channel
    ///
    /// Leaves and discards the previous channel, loads the channel's
    /// overrides, requires `VIEW_CHANNEL`, joins it and merges the latest
    /// page of history.
    #[instrument(skip(self))]
    pub async fn open_channel(&mut self, channel_id: Snowflake) -> ClientResult<Vec<StoreEvent>> {
        self.epoch += 1;
        self.abort_resync();

        let mut events = Vec::new();
        if let Some(previous) = self.active_channel.take() {
            if self.connection.is_connected() {
                if let Err(e) = self
                    .connection
                    .send(&ClientEvent::LeaveChannel { channel_id: previous })
                {
                    debug!(channel_id = %previous, error = %e, "Leave not sent");
                }
            }
            self.typing_sent.remove(&previous);
            events.extend(self.store.discard_channel(previous));
        }

        let api = self.ctx.api();
        let overrides = api.fetch_overrides(channel_id).await?;
        self.store.permissions.set_overrides(channel_id, overrides);
        self.require(Some(channel_id), Permissions::VIEW_CHANNEL)?;

        self.active_channel = Some(channel_id);
        match self.connection.send(&ClientEvent::JoinChannel { channel_id }) {
            Ok(()) => {}
            // Re-sent when the link comes back
            Err(e) if e.is_transient() => debug!(error = %e, "Join deferred until reconnect"),
            Err(e) => return Err(e),
        }

        let limit = self.ctx.config().limits.history_page_size;
        let page = api
            .fetch_messages(channel_id, MessageQuery::latest(limit))
            .await?;
        events.extend(self.store.merge_page(channel_id, page, PageKind::Latest));

        info!(channel_id = %channel_id, messages = self.store.messages(channel_id).len(), "Channel opened");
        Ok(events)
    }

    /// Fetch the page of history before the oldest confirmed message
    #[instrument(skip(self))]
    pub async fn load_older(&mut self) -> ClientResult<Vec<StoreEvent>> {
        let channel_id = self
            .active_channel
            .ok_or_else(|| ClientError::validation("No channel is open"))?;
        let limit = self.ctx.config().limits.history_page_size;

        let query = match self
            .store
            .timeline(channel_id)
            .and_then(Timeline::oldest_confirmed)
        {
            Some(oldest) => MessageQuery::before(oldest.id, limit),
            None => MessageQuery::latest(limit),
        };

        let page = self.ctx.api().fetch_messages(channel_id, query).await?;
        debug!(channel_id = %channel_id, fetched = page.len(), "Older history fetched");
        Ok(self.store.merge_page(channel_id, page, PageKind::Older))
    }

    /// Reload roles, the local member and the active channel's overrides
    #[instrument(skip(self))]
    pub async fn refresh_permissions(&mut self) -> ClientResult<()> {
        let api = self.ctx.api();
        let roles = api.fetch_roles().await?;
        let member = api.fetch_member(self.store.local_user()).await?;
        self.store.permissions.set_roles(roles);
        self.store.permissions.set_member(member);

        if let Some(channel_id) = self.active_channel {
            let overrides = api.fetch_overrides(channel_id).await?;
            self.store.permissions.set_overrides(channel_id, overrides);
        }

        debug!(
            guild_permissions = ?self.store.permissions.guild_permissions(),
            "Permission snapshot refreshed"
        );
        Ok(())
    }

    /// Re-fetch permissions and the latest page in the background
    pub(super) fn start_resync(&mut self) {
        self.abort_resync();

        let api = self.ctx.api();
        let user_id = self.store.local_user();
        let channel_id = self.active_channel;
        let limit = self.ctx.config().limits.history_page_size;
        let epoch = self.epoch;
        let tx = self.resync_tx.clone();

        self.resync = Some(tokio::spawn(async move {
            let result = fetch_resync(api, user_id, channel_id, limit).await;
            let _ = tx.send(Resynced { epoch, result }).await;
        }));
        debug!(epoch, channel_id = ?channel_id, "Resync started");
    }

    pub(super) fn abort_resync(&mut self) {
        if let Some(task) = self.resync.take() {
            task.abort();
        }
    }

    pub(super) fn on_resynced(&mut self, resynced: Resynced) -> Option<Update> {
        if resynced.epoch != self.epoch {
            debug!(
                epoch = resynced.epoch,
                current = self.epoch,
                "Stale resync result dropped"
            );
            return None;
        }
        self.resync = None;

        let data = match resynced.result {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Resync failed");
                return Some(Update::Notice(format!("Resync failed: {e}")));
            }
        };

        self.store.permissions.set_roles(data.roles);
        self.store.permissions.set_member(data.member);

        let mut events = Vec::new();
        if let Some((channel_id, overrides, page)) = data.channel {
            self.store.permissions.set_overrides(channel_id, overrides);
            events = self.store.merge_page(channel_id, page, PageKind::Latest);
        }
        info!(events = events.len(), "Resync applied");
        (!events.is_empty()).then_some(Update::Store(events))
    }
}
