//! REST client tests against the fake authority
//!
//! Run with: cargo test -p integration-tests --test api_client_tests

use chat_api::GUILD_HEADER;
use chat_core::{
    ApiClient, ChannelOverride, DomainError, MessageQuery, OverrideTarget, Permissions, Snowflake,
};
use integration_tests::{fixtures::*, FakeServer};
use reqwest::StatusCode;

// ============================================================================
// Headers and status mapping
// ============================================================================

#[tokio::test]
async fn test_requests_carry_token_and_guild() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client(TOKEN).unwrap();

    let roles = client.fetch_roles().await.unwrap();
    assert_eq!(roles, vec![everyone()]);
    assert_eq!(server.requests(), vec!["GET /roles".to_string()]);
}

#[tokio::test]
async fn test_rejected_token_maps_to_unauthorized() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client("stolen").unwrap();

    let err = client.fetch_roles().await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn test_missing_guild_header_is_forbidden() {
    let server = FakeServer::start().await.unwrap();

    let response = reqwest::Client::new()
        .get(format!("{}/roles", server.base_url()))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = reqwest::Client::new()
        .get(format!("{}/roles", server.base_url()))
        .bearer_auth(TOKEN)
        .header(GUILD_HEADER, GUILD.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_member_is_not_found() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client(TOKEN).unwrap();

    let err = client.fetch_member(Snowflake::new(404)).await.unwrap_err();
    assert!(err.is_not_found());

    let member = client.fetch_member(BOB).await.unwrap();
    assert_eq!(member.guild_id, GUILD);
}

#[tokio::test]
async fn test_server_error_keeps_status_and_message() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client(TOKEN).unwrap();

    server.fail_next(StatusCode::SERVICE_UNAVAILABLE);
    match client.fetch_roles().await.unwrap_err() {
        DomainError::ApiError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Injected failure");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Only the next request fails
    assert!(client.fetch_roles().await.is_ok());
}

// ============================================================================
// Member roles
// ============================================================================

#[tokio::test]
async fn test_member_roles_are_fetched() {
    let server = FakeServer::start().await.unwrap();
    server.set_roles(vec![everyone(), moderator()]);
    server.set_member(member(BOB, &[MODERATOR_ROLE]));
    let client = server.api_client(TOKEN).unwrap();

    let member = client.fetch_member(BOB).await.unwrap();
    assert!(member.has_role(MODERATOR_ROLE));
    assert!(member.has_role(GUILD));
    assert_eq!(server.requests(), vec![format!("GET /members/{BOB}")]);
}

// ============================================================================
// Overrides
// ============================================================================

#[tokio::test]
async fn test_override_put_fetch_delete() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client(TOKEN).unwrap();

    let entry = ChannelOverride::new(
        STAFF_ROOM,
        OverrideTarget::Role(GUILD),
        Permissions::empty(),
        Permissions::VIEW_CHANNEL,
    );
    client.put_override(&entry).await.unwrap();
    assert_eq!(server.overrides(STAFF_ROOM).len(), 1);

    let fetched = client.fetch_overrides(STAFF_ROOM).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].target, OverrideTarget::Role(GUILD));
    assert_eq!(fetched[0].deny, Permissions::VIEW_CHANNEL);
    assert_eq!(fetched[0].channel_id, STAFF_ROOM);

    client
        .delete_override(STAFF_ROOM, OverrideTarget::Role(GUILD))
        .await
        .unwrap();
    assert!(client.fetch_overrides(STAFF_ROOM).await.unwrap().is_empty());

    // A second delete refers to nothing
    let err = client
        .delete_override(STAFF_ROOM, OverrideTarget::Role(GUILD))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_member_override_round_trip() {
    let server = FakeServer::start().await.unwrap();
    server.set_overrides(
        STAFF_ROOM,
        vec![
            role_override(GUILD, Permissions::empty(), Permissions::VIEW_CHANNEL),
            member_override(ALICE, Permissions::VIEW_CHANNEL, Permissions::empty()),
        ],
    );
    let client = server.api_client(TOKEN).unwrap();

    let fetched = client.fetch_overrides(STAFF_ROOM).await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert!(fetched
        .iter()
        .any(|o| o.target == OverrideTarget::Member(ALICE) && o.allow == Permissions::VIEW_CHANNEL));
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_is_returned_oldest_first() {
    let server = FakeServer::start().await.unwrap();
    server.add_messages(GENERAL, history(GENERAL, 1, 5));
    let client = server.api_client(TOKEN).unwrap();

    let page = client
        .fetch_messages(GENERAL, MessageQuery::latest(3))
        .await
        .unwrap();
    let ids: Vec<i64> = page.iter().map(|m| m.id.into_inner()).collect();
    assert_eq!(ids, vec![3, 4, 5]);
    assert!(page.iter().all(|m| !m.is_pending()));
}

#[tokio::test]
async fn test_history_cursor_is_sent() {
    let server = FakeServer::start().await.unwrap();
    server.add_messages(GENERAL, history(GENERAL, 1, 5));
    let client = server.api_client(TOKEN).unwrap();

    let page = client
        .fetch_messages(GENERAL, MessageQuery::before(Snowflake::new(3), 10))
        .await
        .unwrap();
    let ids: Vec<i64> = page.iter().map(|m| m.id.into_inner()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(
        server.requests(),
        vec![format!("GET /channels/{GENERAL}/messages?before=3&limit=10")]
    );
}

#[tokio::test]
async fn test_history_limit_is_checked_before_sending() {
    let server = FakeServer::start().await.unwrap();
    let client = server.api_client(TOKEN).unwrap();

    let err = client
        .fetch_messages(GENERAL, MessageQuery::latest(0))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(server.requests().is_empty());
}
