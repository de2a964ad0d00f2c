//! Client, mirror and poller against a live in-process server.

use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use triqui::api::RemoteStatus;
use triqui::{
    ApiError, GameApiClient, Mark, OnlineApp, Position, RemoteEvent, RemoteGame, RemoteOutcome,
    SessionManager, StatePoller,
};

/// Starts a server on an ephemeral port and returns a client for it.
async fn spawn_server() -> GameApiClient {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let app = triqui::server::router(SessionManager::new());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });
    GameApiClient::new("127.0.0.1", addr.port()).expect("Failed to build client")
}

#[tokio::test]
async fn test_health_and_listing() {
    let client = spawn_server().await;
    client.health().await.expect("Health failed");
    assert!(client.available_games().await.expect("List failed").is_empty());

    let created = client.create_game("alice").await.expect("Create failed");
    let games = client.available_games().await.expect("List failed");
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].game_id, created.game_id);
}

#[tokio::test]
async fn test_server_errors_carry_detail() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");

    let err = client
        .join_game(&created.game_id, "alice")
        .await
        .expect_err("Self-join must fail");
    match err {
        ApiError::Server { status, detail } => {
            assert_eq!(status, 400);
            assert!(!detail.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = client.game_state("nope").await.expect_err("Unknown game");
    assert!(matches!(err, ApiError::Server { status: 404, .. }));
}

#[tokio::test]
async fn test_two_clients_play_to_a_win() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");
    let joined = client
        .join_game(&created.game_id, "bob")
        .await
        .expect("Join failed");

    let mut alice = RemoteGame::from_created(&created);
    let mut bob = RemoteGame::from_joined(&joined);
    assert_eq!(alice.my_mark(), Mark::X);
    assert_eq!(bob.my_mark(), Mark::O);

    let state = client.game_state(&created.game_id).await.expect("State failed");
    alice.apply_state(&state).expect("Apply failed");
    assert!(alice.is_my_turn());
    assert!(bob.check_move(Position::Center).is_err());

    let moves = [
        ("alice", Position::TopLeft),
        ("bob", Position::MiddleLeft),
        ("alice", Position::TopCenter),
        ("bob", Position::Center),
        ("alice", Position::TopRight),
    ];
    for (who, pos) in moves {
        let (player, mirror) = if who == "alice" {
            ("alice", &mut alice)
        } else {
            ("bob", &mut bob)
        };
        let response = client
            .make_move(&created.game_id, player, pos)
            .await
            .expect("Move failed");
        mirror.apply_move_response(&response).expect("Apply failed");
        let state = client.game_state(&created.game_id).await.expect("State failed");
        alice.apply_state(&state).expect("Apply failed");
        bob.apply_state(&state).expect("Apply failed");
    }

    assert_eq!(alice.status(), RemoteStatus::Finished);
    assert_eq!(alice.outcome(), Some(RemoteOutcome::Won));
    assert_eq!(bob.outcome(), Some(RemoteOutcome::Lost));
    assert_eq!(bob.board(), alice.board());
}

#[tokio::test]
async fn test_poller_reports_changes_and_stops_on_finish() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");
    let id = created.game_id.clone();
    client.join_game(&id, "bob").await.expect("Join failed");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = StatePoller::new(
        client.clone(),
        id.clone(),
        Duration::from_millis(20),
        tx,
        shutdown_rx,
    )
    .spawn();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("No event")
        .expect("Channel closed");
    assert!(matches!(first, RemoteEvent::State(_)));

    for (player, pos) in [
        ("alice", Position::TopLeft),
        ("bob", Position::MiddleLeft),
        ("alice", Position::TopCenter),
        ("bob", Position::Center),
        ("alice", Position::TopRight),
    ] {
        client.make_move(&id, player, pos).await.expect("Move failed");
    }

    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(RemoteEvent::Finished(state)) => return Some(state),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .expect("Poller never finished")
    .expect("Channel closed before finish");
    assert_eq!(finished.status, RemoteStatus::Finished);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Poller did not stop")
        .expect("Poller panicked");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_poller_stops_on_shutdown() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");

    let (tx, _rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = StatePoller::new(
        client,
        created.game_id,
        Duration::from_millis(20),
        tx,
        shutdown_rx,
    )
    .spawn();

    shutdown_tx.send(true).expect("Poller gone");
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Poller did not stop")
        .expect("Poller panicked");
}

#[tokio::test]
async fn test_online_app_refuses_and_sends_moves() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");

    let mut app = OnlineApp::new(
        client.clone(),
        "alice".to_string(),
        RemoteGame::from_created(&created),
    );

    // Nobody has joined: refused locally.
    app.handle_key(crossterm::event::KeyCode::Char('5')).await;
    assert_eq!(app.notice(), Some("Not your turn"));

    client
        .join_game(&created.game_id, "bob")
        .await
        .expect("Join failed");
    let state = client
        .game_state(&created.game_id)
        .await
        .expect("State failed");
    app.handle_event(RemoteEvent::State(state));
    assert!(app.game().is_my_turn());

    app.handle_key(crossterm::event::KeyCode::Char('5')).await;
    assert_eq!(app.notice(), None);
    assert!(!app.game().board().is_empty(Position::Center));
    assert_eq!(app.game().turn(), Mark::O);
}

#[tokio::test]
async fn test_poll_error_cleared_by_next_state() {
    let client = spawn_server().await;
    let created = client.create_game("alice").await.expect("Create failed");
    let state = client
        .game_state(&created.game_id)
        .await
        .expect("State failed");

    let mut app = OnlineApp::new(
        client.clone(),
        "alice".to_string(),
        RemoteGame::from_created(&created),
    );
    app.handle_event(RemoteEvent::State(state.clone()));
    app.handle_event(RemoteEvent::PollFailed("Connection error".to_string()));
    assert_eq!(app.notice(), Some("Error: Connection error"));

    // Same state as before the failure.
    app.handle_event(RemoteEvent::State(state));
    assert_eq!(app.notice(), None);
}
