//! Relay Integration Tests
//!
//! Each test starts its own relay on an ephemeral port with an in-memory
//! store, so no external services are required.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use std::time::Duration;

use chat_common::ErrorResponse;
use chat_core::{ChannelId, UserId};
use chat_db::MemoryMessageStore;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use integration_tests::*;
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::{self, Message};

// ============================================================================
// Admission Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/ws").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.code, "MISSING_AUTH");

    let err = tokio_tungstenite::connect_async(format!("ws://{}/ws", server.addr))
        .await
        .unwrap_err();
    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected an HTTP rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/ws?token=not-a-jwt").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let err = tokio_tungstenite::connect_async(server.ws_url("not-a-jwt"))
        .await
        .unwrap_err();
    assert!(matches!(err, tungstenite::Error::Http(ref r) if r.status().as_u16() == 401));

    // Signed with another secret
    let foreign = chat_common::JwtService::new("some-other-secret")
        .issue(&unique_identity("mallory"))
        .unwrap();
    let response = server
        .get(&format!("/ws?token={foreign}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_without_upgrade_is_bad_request() {
    let server = TestServer::start().await.unwrap();
    let token = server.token_for(&unique_identity("plain")).unwrap();

    let response = server.get(&format!("/ws?token={token}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.stats().await.unwrap().sessions, 0);
}

// ============================================================================
// Messaging Tests
// ============================================================================

#[tokio::test]
async fn test_chat_reaches_everyone_in_general() {
    let server = TestServer::start().await.unwrap();
    let alice_id = unique_identity("alice");
    let bob_id = unique_identity("bob");

    let mut alice = server.connect(&alice_id).await.unwrap();
    let mut bob = server.connect(&bob_id).await.unwrap();

    alice.send_json(&chat_frame("hi")).await.unwrap();

    for client in [&mut alice, &mut bob] {
        let chat = client.next_chat().await.unwrap();
        assert_eq!(chat.content, "hi");
        assert_eq!(chat.channel_id, ChannelId::GENERAL);
        assert_eq!(chat.user_id, alice_id.user_id);
        assert_eq!(chat.username, alice_id.username);
        assert!(chat.timestamp <= Utc::now());
    }

    // Persisted exactly once, in the background
    let deadline = tokio::time::Instant::now() + WAIT;
    while server.store.message_count(ChannelId::GENERAL) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "message never persisted");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let saved = server.store.messages(ChannelId::GENERAL);
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].user_id, alice_id.user_id);
    assert_eq!(saved[0].content, "hi");
}

#[tokio::test]
async fn test_switch_isolates_channels() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect(&unique_identity("alice")).await.unwrap();
    let mut bob = server.connect(&unique_identity("bob")).await.unwrap();
    let seven = ChannelId::new(7);

    alice.send_json(&switch_frame(seven)).await.unwrap();
    server
        .wait_for_stats(|stats| stats.channels == 2)
        .await
        .unwrap();

    bob.send_json(&chat_frame("general news")).await.unwrap();
    assert_eq!(bob.next_chat().await.unwrap().content, "general news");

    alice.send_json(&chat_frame_to(seven, "seven news")).await.unwrap();
    let chat = alice.next_chat().await.unwrap();
    assert_eq!(chat.content, "seven news");
    assert_eq!(chat.channel_id, seven);

    alice.expect_no_chat(Duration::from_millis(200)).await.unwrap();
    bob.expect_no_chat(Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn test_blank_messages_are_ignored() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.connect(&unique_identity("alice")).await.unwrap();

    alice.send_json(&chat_frame("   ")).await.unwrap();
    alice.send_json(&chat_frame("real")).await.unwrap();

    assert_eq!(alice.next_chat().await.unwrap().content, "real");
    alice.expect_no_chat(Duration::from_millis(200)).await.unwrap();
}

// ============================================================================
// History Tests
// ============================================================================

#[tokio::test]
async fn test_history_replayed_oldest_first_on_join() {
    let writer = UserId::new(1);
    let store = MemoryMessageStore::new().with_user(writer, "archivist");
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    for i in 0..3 {
        store.insert_at(
            ChannelId::GENERAL,
            writer,
            format!("entry {i}"),
            base + ChronoDuration::minutes(i),
        );
    }
    let server = TestServer::start_with_store(store).await.unwrap();

    let mut reader = server.connect(&unique_identity("reader")).await.unwrap();
    let history = reader.next_chats(3).await.unwrap();

    let contents: Vec<_> = history.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["entry 0", "entry 1", "entry 2"]);
    assert_eq!(history[0].timestamp, base);
    assert_eq!(history[2].timestamp, base + ChronoDuration::minutes(2));
    assert!(history.iter().all(|c| c.username == "archivist"));
}

#[tokio::test]
async fn test_history_replayed_on_switch() {
    let writer = UserId::new(2);
    let store = MemoryMessageStore::new().with_user(writer, "poster");
    store.insert_at(ChannelId::new(9), writer, "nine", Utc::now());
    let server = TestServer::start_with_store(store).await.unwrap();

    let mut client = server.connect(&unique_identity("visitor")).await.unwrap();
    client.expect_no_chat(Duration::from_millis(100)).await.unwrap();

    client.send_json(&switch_frame(ChannelId::new(9))).await.unwrap();
    let chat = client.next_chat().await.unwrap();
    assert_eq!(chat.content, "nine");
    assert_eq!(chat.channel_id, ChannelId::new(9));
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_protocol_violation_ends_session() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(&unique_identity("rude")).await.unwrap();

    client
        .send(Message::Text("this is not json".to_string()))
        .await
        .unwrap();

    client.expect_closed().await.unwrap();
    server.wait_for_sessions(0).await.unwrap();
}

#[tokio::test]
async fn test_client_close_unregisters() {
    let server = TestServer::start().await.unwrap();
    let alice = server.connect(&unique_identity("alice")).await.unwrap();
    let _bob = server.connect(&unique_identity("bob")).await.unwrap();

    alice.close().await.unwrap();
    server.wait_for_sessions(1).await.unwrap();
}
