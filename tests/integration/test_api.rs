//! Integration tests for the HTTP API against a live server.
//!
//! The server runs the fixture deck with a short feedback delay so the
//! paced transition can be observed.

use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use quizdeck_session::{
    create_router, AnswerResponse, AppState, Config, Mode, QuizStore, SessionStatus, SessionView,
    Summary,
};
use serde_json::json;

const FEEDBACK_DELAY_MS: u64 = 20;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

fn fixture_state(mode: Mode) -> AppState {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    let store = QuizStore::load(&dir.join("scenarios.json"), &dir.join("cards.json"))
        .expect("fixture data should load");
    let config = Config {
        feedback_delay_ms: FEEDBACK_DELAY_MS,
        ..Config::default()
    };
    AppState::new(config, store, mode)
}

/// Spawns the test server and returns its base URL.
async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
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

    (format!("http://{addr}"), handle)
}

async fn get_view(client: &reqwest::Client, base: &str) -> SessionView {
    client
        .get(format!("{base}/api/session"))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid session view")
}

async fn answer(client: &reqwest::Client, base: &str, yes: bool) -> AnswerResponse {
    let response = client
        .post(format!("{base}/api/session/answer"))
        .json(&json!({ "answer": yes }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.expect("invalid answer response")
}

/// Polls the view until the session leaves `pending`.
async fn wait_for_advance(client: &reqwest::Client, base: &str) -> SessionView {
    for _ in 0..50 {
        let view = get_view(client, base).await;
        if view.status != SessionStatus::Pending {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(FEEDBACK_DELAY_MS)).await;
    }
    panic!("session never left the pending state");
}

#[tokio::test]
async fn test_initial_view_shows_first_turn() {
    let (base, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;
    let client = reqwest::Client::new();

    let view = get_view(&client, &base).await;
    assert_eq!(view.status, SessionStatus::InProgress);
    assert_eq!(view.mode_label, "Student Mode");

    let progress = view.progress.expect("in play");
    assert_eq!((progress.question, progress.total), (1, 4));
    assert_eq!((progress.scenario, progress.scenario_total), (1, 2));

    let turn = view.turn.expect("in play");
    assert_eq!(turn.scenario_id, "free-fall");
    assert!(turn.card.is_some_and(|c| c.is_image()));
}

#[tokio::test]
async fn test_full_session_over_http() {
    let (base, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;
    let client = reqwest::Client::new();

    // correct, correct, incorrect, incorrect
    for (i, yes) in [true, false, false, true].into_iter().enumerate() {
        let response = answer(&client, &base, yes).await;
        assert!(response.acknowledged, "answer {i} should be accepted");

        let view = wait_for_advance(&client, &base).await;
        if i < 3 {
            assert_eq!(view.status, SessionStatus::InProgress);
            assert_eq!(view.position, i + 1);
        } else {
            assert_eq!(view.status, SessionStatus::Finished);
            assert!(view.turn.is_none());
        }
    }

    let summary: Summary = client
        .get(format!("{base}/api/session/summary"))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid summary");
    assert_eq!(summary.score, 2);
    assert_eq!(summary.strikes, 2);
    assert_eq!(summary.passed(), Some(false));
}

#[tokio::test]
async fn test_answer_during_pause_is_ignored() {
    // A long pause so the second answer surely lands inside it.
    let mut state = fixture_state(Mode::Student);
    state.config.feedback_delay_ms = 2_000;
    let (base, _handle) = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let first = answer(&client, &base, true).await;
    assert!(first.acknowledged);
    assert_eq!(first.status, SessionStatus::Pending);

    let second = answer(&client, &base, false).await;
    assert!(!second.acknowledged);
    assert!(second.result.is_none());
    assert_eq!(second.status, SessionStatus::Pending);

    let view = get_view(&client, &base).await;
    assert_eq!(view.score, 1);
    assert_eq!(view.strikes, 0);
    assert_eq!(view.position, 0);
}

#[tokio::test]
async fn test_summary_conflict_while_playing() {
    let (base, _handle) = spawn_test_server(fixture_state(Mode::Teacher)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/session/summary"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_restart_switches_mode() {
    let (base, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;
    let client = reqwest::Client::new();

    let view: SessionView = client
        .post(format!("{base}/api/session?mode=teacher"))
        .send()
        .await
        .expect("request failed")
        .json()
        .await
        .expect("invalid view");
    assert_eq!(view.mode, Mode::Teacher);
    assert_eq!(view.position, 0);

    // Teacher mode survives three strikes.
    for yes in [false, true, false] {
        let response = answer(&client, &base, yes).await;
        assert!(response.acknowledged);
        wait_for_advance(&client, &base).await;
    }
    let view = get_view(&client, &base).await;
    assert_eq!(view.status, SessionStatus::InProgress);
    assert_eq!(view.strikes, 3);
    assert_eq!(view.score, 0);
    assert_eq!(view.position, 3);
}

#[tokio::test]
async fn test_card_endpoint() {
    let (base, _handle) = spawn_test_server(fixture_state(Mode::Student)).await;
    let client = reqwest::Client::new();

    let found = client
        .get(format!("{base}/api/cards/text-net-force-zero"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(found.status(), reqwest::StatusCode::OK);
    let card: serde_json::Value = found.json().await.expect("invalid card");
    assert_eq!(card["type"], "text");
    assert_eq!(card["text"], "The net force on the cart is zero.");

    let missing = client
        .get(format!("{base}/api/cards/graph-position-parabola"))
        .send()
        .await
        .expect("request failed");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}
