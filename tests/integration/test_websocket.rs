//! Integration tests for the WebSocket feedback event stream.
//!
//! These tests validate connection handling, the events produced by answers
//! and their paced transitions, and delivery to several clients.

use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use quizdeck_session::{
    create_router, AppState, Config, Feedback, Mode, QuizStore, SessionEvent, SessionStatus,
};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn fixture_state(mode: Mode) -> AppState {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    let store = QuizStore::load(&dir.join("scenarios.json"), &dir.join("cards.json"))
        .expect("fixture data should load");
    let config = Config {
        feedback_delay_ms: 20,
        ..Config::default()
    };
    AppState::new(config, store, mode)
}

/// Spawns the test server and returns the HTTP base and WebSocket URLs.
async fn spawn_test_server(state: AppState) -> (String, String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), format!("ws://{addr}/ws"), handle)
}

/// Connects a WebSocket client to the given URL.
async fn connect_client(url: &str) -> WsClient {
    let (ws_stream, _) = connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next text message and parses it as a `SessionEvent`.
/// Automatically handles ping frames by responding with pong.
async fn receive_event(client: &mut WsClient) -> SessionEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

async fn post_answer(base: &str, yes: bool) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/session/answer"))
        .json(&json!({ "answer": yes }))
        .send()
        .await
        .expect("request failed");
    assert!(response.status().is_success());
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_client_receives_connected_event_on_connect() {
    let (_base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client = connect_client(&ws_url).await;
    let event = receive_event(&mut client).await;

    let SessionEvent::Connected(payload) = event.clone() else {
        panic!("Expected Connected event, got: {event:?}");
    };
    assert_eq!(payload.session.status, SessionStatus::InProgress);
    assert_eq!(payload.session.position, 0);
    assert_eq!(payload.session.mode, Mode::Student);
}

#[tokio::test]
async fn test_connected_event_reflects_current_session() {
    let state = fixture_state(Mode::Teacher);
    {
        let mut session = state.session.lock().await;
        session.submit_answer(false).expect("answer accepted");
        session.advance().expect("pending");
    }
    let (_base, ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    let SessionEvent::Connected(payload) = receive_event(&mut client).await else {
        panic!("Expected Connected event");
    };
    assert_eq!(payload.session.position, 1);
    assert_eq!(payload.session.strikes, 1);
    assert_eq!(payload.session.mode_label, "Teacher Mode");
}

// ============================================================================
// Answer Event Tests
// ============================================================================

#[tokio::test]
async fn test_answer_emits_feedback_then_advance() {
    let (base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client = connect_client(&ws_url).await;
    let _connected = receive_event(&mut client).await;

    post_answer(&base, true).await;

    let SessionEvent::AnswerFeedback(feedback) = receive_event(&mut client).await else {
        panic!("Expected AnswerFeedback event");
    };
    assert_eq!(feedback.position, 0);
    assert_eq!(feedback.feedback, Feedback::Correct);
    assert_eq!(feedback.score, 1);

    let SessionEvent::TurnAdvanced(advanced) = receive_event(&mut client).await else {
        panic!("Expected TurnAdvanced event");
    };
    assert_eq!(advanced.session_id, feedback.session_id);
    assert_eq!(advanced.position, 1);
}

#[tokio::test]
async fn test_last_answer_emits_session_finished() {
    let (base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client = connect_client(&ws_url).await;
    let _connected = receive_event(&mut client).await;

    // correct, correct, incorrect, incorrect
    for (i, yes) in [true, false, false, true].into_iter().enumerate() {
        post_answer(&base, yes).await;

        let feedback = receive_event(&mut client).await;
        assert_eq!(feedback.event_name(), "answer_feedback");

        let next = receive_event(&mut client).await;
        if i < 3 {
            assert_eq!(next.event_name(), "turn_advanced");
        } else {
            let SessionEvent::SessionFinished(finished) = next.clone() else {
                panic!("Expected SessionFinished event, got: {next:?}");
            };
            assert_eq!(finished.summary.total_questions, 4);
            assert_eq!(finished.summary.score, 2);
            assert_eq!(finished.summary.passed(), Some(false));
        }
    }
}

#[tokio::test]
async fn test_restart_emits_session_started() {
    let (base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client = connect_client(&ws_url).await;
    let _connected = receive_event(&mut client).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/session?mode=teacher"))
        .send()
        .await
        .expect("request failed");
    assert!(response.status().is_success());

    let SessionEvent::SessionStarted(started) = receive_event(&mut client).await else {
        panic!("Expected SessionStarted event");
    };
    assert_eq!(started.mode, Mode::Teacher);
    assert_eq!(started.total_questions, 4);
}

// ============================================================================
// Multiple Client Tests
// ============================================================================

#[tokio::test]
async fn test_events_broadcast_to_all_clients() {
    let (base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client1 = connect_client(&ws_url).await;
    let mut client2 = connect_client(&ws_url).await;
    let _ = receive_event(&mut client1).await;
    let _ = receive_event(&mut client2).await;

    post_answer(&base, false).await;

    for client in [&mut client1, &mut client2] {
        let SessionEvent::AnswerFeedback(feedback) = receive_event(client).await else {
            panic!("Expected AnswerFeedback event");
        };
        assert_eq!(feedback.feedback, Feedback::Incorrect);
        assert_eq!(feedback.strikes, 1);
    }
}

#[tokio::test]
async fn test_client_can_disconnect() {
    let (_base, ws_url, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;

    let mut client = connect_client(&ws_url).await;
    let _ = receive_event(&mut client).await;

    client.close(None).await.expect("Failed to close");
}
