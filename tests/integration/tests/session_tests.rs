//! End-to-end session tests over real sockets
//!
//! Each test starts a fake authority on a random port and drives a session
//! through the WebSocket gateway and the REST client.
//!
//! Run with: cargo test -p integration-tests --test session_tests

use chat_common::ErrorKind;
use chat_core::{Permissions, StoreEvent};
use chat_gateway::{ClientEvent, ServerEvent};
use chat_service::{Session, SessionContext, Update};
use chrono::{Duration, Utc};
use integration_tests::{activate, fixtures::*, wait_for, FakeServer};

fn ids(session: &Session) -> Vec<i64> {
    session
        .store()
        .messages(GENERAL)
        .iter()
        .map(|m| m.id.into_inner())
        .collect()
}

// ============================================================================
// Activation
// ============================================================================

#[tokio::test]
async fn test_activation_identifies_and_loads_permissions() {
    let server = FakeServer::start().await.unwrap();

    let session = activate(&server).await.unwrap();

    assert_eq!(session.local_user(), ALICE);
    assert_eq!(session.user_name(), "alice");
    assert_eq!(server.identified(), 1);
    assert!(session.check_permission(None, Permissions::SEND_MESSAGES));
    assert!(!session.check_permission(None, Permissions::MANAGE_MESSAGES));

    let requests = server.requests();
    assert!(requests.contains(&"GET /roles".to_string()));
    assert!(requests.contains(&format!("GET /members/{ALICE}")));
}

#[tokio::test]
async fn test_rejected_token_fails_activation() {
    let server = FakeServer::start().await.unwrap();
    let ctx = SessionContext::from_config(server.config_with_token("stolen").unwrap()).unwrap();

    let err = Session::activate(ctx).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(server.identified(), 0);
    assert!(server.requests().is_empty());
}

// ============================================================================
// Channels and messages
// ============================================================================

#[tokio::test]
async fn test_open_channel_joins_and_merges_history() {
    let mut server = FakeServer::start().await.unwrap();
    server.add_messages(GENERAL, history(GENERAL, 1, 3));
    let mut session = activate(&server).await.unwrap();

    let events = session.open_channel(GENERAL).await.unwrap();

    assert_eq!(
        events,
        vec![StoreEvent::HistoryMerged {
            channel_id: GENERAL,
            added: 3,
        }]
    );
    assert_eq!(ids(&session), vec![1, 2, 3]);
    assert_eq!(
        server.next_client_event().await.unwrap(),
        ClientEvent::JoinChannel { channel_id: GENERAL }
    );
}

#[tokio::test]
async fn test_hidden_channel_is_refused() {
    let server = FakeServer::start().await.unwrap();
    server.set_overrides(
        STAFF_ROOM,
        vec![role_override(GUILD, Permissions::empty(), Permissions::VIEW_CHANNEL)],
    );
    let mut session = activate(&server).await.unwrap();

    let err = session.open_channel(STAFF_ROOM).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(session.active_channel(), None);
}

#[tokio::test]
async fn test_sent_message_is_confirmed_by_echo() {
    let mut server = FakeServer::start().await.unwrap();
    let mut session = activate(&server).await.unwrap();
    session.open_channel(GENERAL).await.unwrap();

    let events = session.send_message(GENERAL, "hello there").unwrap();
    let provisional = match events.as_slice() {
        [StoreEvent::MessageInserted { message_id, .. }] => *message_id,
        other => panic!("unexpected events: {other:?}"),
    };
    assert!(provisional.is_provisional());
    assert!(session.store().messages(GENERAL)[0].is_pending());

    let sent = server
        .expect_client_event(|e| matches!(e, ClientEvent::SendMessage { .. }))
        .await
        .unwrap();
    match sent {
        ClientEvent::SendMessage {
            content,
            user_id,
            nonce,
            ..
        } => {
            assert_eq!(content, "hello there");
            assert_eq!(user_id, ALICE);
            assert!(nonce.is_some());
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let update = wait_for(&mut session, |u| {
        u.store_events()
            .iter()
            .any(|e| matches!(e, StoreEvent::MessageConfirmed { .. }))
    })
    .await
    .unwrap();
    assert!(update.store_events().contains(&StoreEvent::MessageConfirmed {
        channel_id: GENERAL,
        provisional_id: provisional,
        message_id: chat_core::Snowflake::new(1_000),
    }));

    let messages = session.store().messages(GENERAL);
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].is_pending());
    assert_eq!(messages[0].content, "hello there");
}

#[tokio::test]
async fn test_remote_message_and_typing_arrive() {
    let server = FakeServer::start().await.unwrap();
    let mut session = activate(&server).await.unwrap();
    session.open_channel(GENERAL).await.unwrap();

    server.push(ServerEvent::TypingStart {
        channel_id: GENERAL,
        user_id: BOB,
        user_name: "bob".to_string(),
    });
    let update = wait_for(&mut session, |u| !u.store_events().is_empty())
        .await
        .unwrap();
    assert_eq!(
        update.store_events(),
        [StoreEvent::TypingChanged { channel_id: GENERAL }]
    );

    let message = history_message(42, GENERAL, BOB, "hi alice");
    server.push(ServerEvent::NewMessage {
        message: chat_gateway::protocol::MessagePayload::from_message(&message.into()),
        nonce: None,
    });
    wait_for(&mut session, |u| {
        u.store_events()
            .contains(&StoreEvent::MessageInserted {
                channel_id: GENERAL,
                message_id: chat_core::Snowflake::new(42),
            })
    })
    .await
    .unwrap();
    assert_eq!(ids(&session), vec![42]);
}

#[tokio::test]
async fn test_timed_out_user_cannot_send() {
    let server = FakeServer::start().await.unwrap();
    let mut session = activate(&server).await.unwrap();
    session.open_channel(GENERAL).await.unwrap();

    server.push(ServerEvent::TimedOut {
        user_id: ALICE,
        until: Utc::now() + Duration::hours(1),
    });
    wait_for(&mut session, |u| {
        u.store_events()
            .iter()
            .any(|e| matches!(e, StoreEvent::TimeoutChanged { until: Some(_) }))
    })
    .await
    .unwrap();

    let err = session.send_message(GENERAL, "let me talk").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(session.store().messages(GENERAL).is_empty());
}

#[tokio::test]
async fn test_moderator_times_out_member() {
    let mut server = FakeServer::start().await.unwrap();
    server.set_roles(vec![everyone(), moderator()]);
    server.set_member(member(ALICE, &[MODERATOR_ROLE]));
    let session = activate(&server).await.unwrap();

    session.timeout_user(BOB, 600).unwrap();

    assert_eq!(
        server
            .expect_client_event(|e| matches!(e, ClientEvent::TimeoutUser { .. }))
            .await
            .unwrap(),
        ClientEvent::TimeoutUser {
            user_id: BOB,
            duration_seconds: 600,
        }
    );
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_reconnect_rejoins_and_resyncs_without_duplicates() {
    let mut server = FakeServer::start().await.unwrap();
    server.add_messages(GENERAL, history(GENERAL, 1, 2));
    let mut session = activate(&server).await.unwrap();
    session.open_channel(GENERAL).await.unwrap();
    server
        .expect_client_event(|e| matches!(e, ClientEvent::JoinChannel { .. }))
        .await
        .unwrap();

    // Posted while the client is away; only the resync can see it
    server.add_messages(GENERAL, history(GENERAL, 3, 1));
    assert_eq!(server.kick(), 1);

    wait_for(&mut session, |u| matches!(u, Update::Disconnected { .. }))
        .await
        .unwrap();
    wait_for(&mut session, |u| matches!(u, Update::Connected { resumed: true }))
        .await
        .unwrap();
    assert_eq!(
        server
            .expect_client_event(|e| matches!(e, ClientEvent::JoinChannel { .. }))
            .await
            .unwrap(),
        ClientEvent::JoinChannel { channel_id: GENERAL }
    );

    let update = wait_for(&mut session, |u| {
        u.store_events()
            .iter()
            .any(|e| matches!(e, StoreEvent::HistoryMerged { .. }))
    })
    .await
    .unwrap();
    assert!(update.store_events().contains(&StoreEvent::HistoryMerged {
        channel_id: GENERAL,
        added: 1,
    }));
    assert_eq!(ids(&session), vec![1, 2, 3]);
    assert_eq!(server.identified(), 2);
}

#[tokio::test]
async fn test_deactivate_leaves_channel() {
    let mut server = FakeServer::start().await.unwrap();
    let mut session = activate(&server).await.unwrap();
    session.open_channel(GENERAL).await.unwrap();

    session.deactivate().await;

    assert_eq!(
        server
            .expect_client_event(|e| matches!(e, ClientEvent::LeaveChannel { .. }))
            .await
            .unwrap(),
        ClientEvent::LeaveChannel { channel_id: GENERAL }
    );
}
