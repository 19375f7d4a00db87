//! Integration tests for the server facade: join, input, polling, leave,
//! timeouts, idle teardown, and the wire-level handlers.

use std::sync::Arc;
use std::time::Duration;

use balloono::prelude::*;
use futures_util::FutureExt;
use serde_json::{Value, json};

// =========================================================================
// Helpers
// =========================================================================

/// A server with the automatic loop disabled; tests call `tick` by hand.
fn manual_server() -> Arc<BalloonoServer> {
    BalloonoServer::builder().tick_rate(0).seed(11).build()
}

fn right() -> InputCommand {
    InputCommand {
        movement: 1.0,
        ..InputCommand::default()
    }
}

// =========================================================================
// Join and snapshots
// =========================================================================

#[tokio::test]
async fn test_join_creates_room_and_returns_snapshot() {
    let server = manual_server();

    let joined = server.join("Lobby", "alice").await.unwrap();

    assert_eq!(joined.room_id.as_str(), "lobby");
    let me = joined.state.player(joined.player_id).unwrap();
    assert_eq!(me.name, "alice");
    assert!(me.banana_ready);
    assert_eq!(me.balloon_capacity, 1);
    assert_eq!(server.room_count().await, 1);
}

#[tokio::test]
async fn test_players_in_same_room_see_each_other() {
    let server = manual_server();
    let a = server.join("lobby", "a").await.unwrap();
    let b = server.join("LOBBY", "b").await.unwrap();

    assert_ne!(a.player_id, b.player_id);
    let snapshot = server.get_snapshot("lobby", a.player_id).await.unwrap();
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(server.room_count().await, 1);
}

#[tokio::test]
async fn test_snapshot_of_unknown_room_is_not_found() {
    let server = manual_server();
    let err = server.get_snapshot("nowhere", PlayerId(1)).await.unwrap_err();
    assert!(err.is_room_not_found());
}

#[tokio::test]
async fn test_input_moves_player_on_tick() {
    let server = manual_server();
    let joined = server.join("lobby", "mover").await.unwrap();
    let start = joined.state.player(joined.player_id).unwrap().x;

    server.submit_input("lobby", joined.player_id, right()).await;
    server.tick(Duration::from_millis(200)).await;

    let snapshot = server.get_snapshot("lobby", joined.player_id).await.unwrap();
    assert_eq!(snapshot.server_time, 0.2);
    let x = snapshot.player(joined.player_id).unwrap().x;
    assert!((x - (start + 50.0)).abs() < 1e-9);
}

#[tokio::test]
async fn test_bad_input_never_fails() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();

    // Unknown room, unknown player, garbage movement.
    server.submit_input("nowhere", joined.player_id, right()).await;
    server.submit_input("lobby", PlayerId(u64::MAX), right()).await;
    let garbage = InputCommand {
        movement: f64::NAN,
        ..InputCommand::default()
    };
    server.submit_input("lobby", joined.player_id, garbage).await;

    server.tick(Duration::from_millis(100)).await;
    let snapshot = server.get_snapshot("lobby", joined.player_id).await.unwrap();
    assert_eq!(snapshot.player(joined.player_id).unwrap().moving, 0);
}

// =========================================================================
// Leave, timeouts, idle rooms
// =========================================================================

#[tokio::test]
async fn test_leave_removes_player_at_next_tick() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();

    server.leave("lobby", joined.player_id).await;
    server.tick(Duration::from_millis(50)).await;

    let snapshot = server.get_snapshot("lobby", joined.player_id).await.unwrap();
    assert!(snapshot.player(joined.player_id).is_none());

    // Leaving twice, or from a room that doesn't exist, is harmless.
    server.leave("lobby", joined.player_id).await;
    server.leave("nowhere", joined.player_id).await;
}

#[tokio::test(start_paused = true)]
async fn test_silent_player_times_out() {
    let server = BalloonoServer::builder()
        .tick_rate(0)
        .session_config(SessionConfig {
            player_timeout: Duration::from_secs(30),
        })
        .build();
    let quiet = server.join("lobby", "quiet").await.unwrap();
    let chatty = server.join("lobby", "chatty").await.unwrap();

    tokio::time::advance(Duration::from_secs(20)).await;
    server.submit_input("lobby", chatty.player_id, InputCommand::default()).await;
    tokio::time::advance(Duration::from_secs(11)).await;

    let summary = server.tick(Duration::from_millis(50)).await;
    assert_eq!(summary.players_expired, vec![quiet.player_id]);

    let snapshot = server.get_snapshot("lobby", chatty.player_id).await.unwrap();
    assert!(snapshot.player(quiet.player_id).is_none());
    assert!(snapshot.player(chatty.player_id).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_leave_naming_another_room_is_ignored() {
    let server = manual_server();
    let joined = server.join("arena", "p").await.unwrap();
    server.join("elsewhere", "bystander").await.unwrap();

    server.leave("elsewhere", joined.player_id).await;
    server.tick(Duration::from_millis(50)).await;

    let snapshot = server.get_snapshot("arena", joined.player_id).await.unwrap();
    assert!(snapshot.player(joined.player_id).is_some());
    assert_eq!(server.session_state(joined.player_id).await, Some(SessionState::Active));

    // The session still times out and takes the player out of the arena.
    tokio::time::advance(Duration::from_secs(31)).await;
    let summary = server.tick(Duration::from_millis(50)).await;
    assert!(summary.players_expired.contains(&joined.player_id));
    let snapshot = server.get_snapshot("arena", PlayerId(u64::MAX)).await.unwrap();
    assert!(snapshot.player(joined.player_id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_requests_against_another_room_do_not_keep_a_player_alive() {
    let server = manual_server();
    let joined = server.join("arena", "p").await.unwrap();
    server.join("lobby", "other").await.unwrap();

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(11)).await;
        server.get_snapshot("lobby", joined.player_id).await.unwrap();
        server.submit_input("lobby", joined.player_id, right()).await;
    }

    let summary = server.tick(Duration::from_millis(50)).await;
    assert!(summary.players_expired.contains(&joined.player_id));
}

#[tokio::test(start_paused = true)]
async fn test_expired_session_is_reported_until_the_next_step() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();

    tokio::time::advance(Duration::from_secs(31)).await;
    server.tick(Duration::from_millis(50)).await;
    assert_eq!(server.session_state(joined.player_id).await, Some(SessionState::Expired));

    // Too late to count as activity.
    server.submit_input("lobby", joined.player_id, right()).await;
    server.tick(Duration::from_millis(50)).await;
    assert_eq!(server.session_state(joined.player_id).await, None);
}

#[tokio::test]
async fn test_idle_room_is_torn_down_and_rejoined_fresh() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();
    server.tick(Duration::from_secs(5)).await;
    server.leave("lobby", joined.player_id).await;

    assert!(server.tick(Duration::from_secs(30)).await.rooms_removed.is_empty());
    assert!(server.tick(Duration::from_secs(30)).await.rooms_removed.is_empty());
    let summary = server.tick(Duration::from_secs(30)).await;
    assert_eq!(summary.rooms_removed, vec![RoomKey::new("lobby")]);
    assert_eq!(server.room_count().await, 0);

    let err = server.get_snapshot("lobby", joined.player_id).await.unwrap_err();
    assert!(err.is_room_not_found());

    let again = server.join("lobby", "back").await.unwrap();
    assert_eq!(again.state.server_time, 0.0);
    assert_eq!(again.state.players.len(), 1);
}

#[tokio::test]
async fn test_join_racing_an_idle_teardown_lands_in_a_live_room() {
    let server = BalloonoServer::builder()
        .tick_rate(0)
        .room_config(RoomConfig {
            idle_threshold: Duration::ZERO,
            seed: Some(1),
            ..RoomConfig::default()
        })
        .build();
    let first = server.join("lobby", "first").await.unwrap();
    server.leave("lobby", first.player_id).await;

    // This tick empties the room and retires it, while the join is
    // already holding its handle.
    let (_, joined) = tokio::join!(
        server.tick(Duration::from_millis(50)),
        server.join("lobby", "second")
    );
    let joined = joined.unwrap();

    server.tick(Duration::from_millis(50)).await;
    let snapshot = server.get_snapshot("lobby", joined.player_id).await.unwrap();
    assert!(snapshot.player(joined.player_id).is_some());
    assert_eq!(server.room_count().await, 1);
}

#[tokio::test]
async fn test_polling_does_not_wait_for_a_tick_in_flight() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();

    let ticking = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.tick(Duration::from_millis(50)).await }
    });
    tokio::task::yield_now().await;

    let polled = server.get_snapshot("lobby", joined.player_id).now_or_never();
    assert!(matches!(polled, Some(Ok(_))));
    ticking.await.unwrap();
}

// =========================================================================
// Driver loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_loop_advances_rooms_with_elapsed_time() {
    let server = BalloonoServer::builder().tick_rate(20).seed(3).build();
    tokio::spawn(Arc::clone(&server).run());

    let joined = server.join("lobby", "runner").await.unwrap();
    let start = joined.state.player(joined.player_id).unwrap().x;
    server.submit_input("lobby", joined.player_id, right()).await;

    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = server.get_snapshot("lobby", joined.player_id).await.unwrap();
    assert!(snapshot.server_time >= 0.5, "server time {}", snapshot.server_time);
    assert!(snapshot.player(joined.player_id).unwrap().x > start);
}

// =========================================================================
// Wire-level handlers
// =========================================================================

#[tokio::test]
async fn test_handle_join_round_trip() {
    let server = manual_server();
    let body = json!({ "room": "Arena", "name": "bob" }).to_string();

    let bytes = server.handle_join(body.as_bytes()).await.unwrap();
    let response: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(response["roomId"], "arena");
    assert!(response["playerId"].is_u64());
    assert_eq!(response["state"]["players"][0]["name"], "bob");
    assert_eq!(response["state"]["width"], 800.0);
}

#[tokio::test]
async fn test_handle_join_defaults_to_lobby() {
    let server = manual_server();
    let bytes = server.handle_join(b"{}").await.unwrap();
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response["roomId"], "lobby");
    assert_eq!(response["state"]["players"][0]["name"], "player");
}

#[tokio::test]
async fn test_handle_input_queues_input() {
    let server = manual_server();
    let joined = server.join("lobby", "p").await.unwrap();
    let body = json!({
        "roomId": "lobby",
        "playerId": joined.player_id.0,
        "move": 1,
        "placeBalloon": true,
    })
    .to_string();

    server.handle_input(body.as_bytes()).await.unwrap();
    server.tick(Duration::from_millis(50)).await;

    let bytes = server.handle_state("lobby", joined.player_id).await.unwrap();
    let snapshot: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(snapshot["placedBalloons"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["players"][0]["moving"], 1);
    assert_eq!(snapshot["players"][0]["liveBalloons"], 1);
}

#[tokio::test]
async fn test_handle_input_rejects_malformed_body() {
    let server = manual_server();
    let err = server.handle_input(b"{not json").await.unwrap_err();
    assert!(matches!(err, BalloonoError::Protocol(_)));
}
