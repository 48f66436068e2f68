//! HTTP API endpoints for quizdeck.
//!
//! The browser UI drives a single shared session through these routes. The
//! server owns the feedback pause: an accepted answer parks the session in
//! `pending`, and a timer applies the transition after `feedbackDelayMs`.
//!
//! # Endpoints
//!
//! - `POST /api/session?mode=...` - Start a fresh session
//! - `GET /api/session` - Current session view
//! - `POST /api/session/answer` - Submit a yes/no judgement
//! - `GET /api/session/summary` - Summary of a finished session
//! - `GET /api/cards/:id` - Look up a card
//! - `GET /ws` - Feedback event stream
//!
//! # Example
//!
//! ```no_run
//! use quizdeck_session::{create_router, AppState, Config, Mode, QuizStore};
//!
//! # async fn example() {
//! let config = Config::default();
//! let store = QuizStore::load(config.scenarios.as_ref(), config.cards.as_ref()).unwrap();
//! let state = AppState::new(config, store, Mode::Student);
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::deck::build_deck;
use crate::session::{Feedback, Mode, Progress, Session, SessionStatus, TurnResult, MAX_STRIKES};
use crate::store::{Card, QuizStore};
use crate::summary::Summary;
use crate::websocket::{ws_handler, EventBroadcaster, SessionEvent};
use crate::Config;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string for `POST /api/session`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartQuery {
    /// Raw mode parameter; see [`Mode::from_param`].
    pub mode: Option<String>,
}

/// Request body for the answer endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnswerRequest {
    /// `true` for "yes, this card is correct".
    pub answer: bool,
}

/// Response body for the answer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// `false` when the submission arrived while no answer was expected.
    pub acknowledged: bool,
    /// Outcome of an acknowledged submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TurnResult>,
    /// Session status after handling the submission.
    pub status: SessionStatus,
}

/// The turn currently shown, without its ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    /// Scenario id.
    pub scenario_id: String,
    /// Scenario description shown above the card.
    pub scenario_description: String,
    /// Slot id.
    pub slot_id: String,
    /// Slot category.
    pub category: String,
    /// Card id.
    pub card_id: String,
    /// The looked-up card; `None` renders as a degraded card.
    pub card: Option<Card>,
}

/// Session as the UI renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session identifier.
    pub session_id: u64,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Session mode.
    pub mode: Mode,
    /// Mode label shown during play.
    pub mode_label: String,
    /// Current deck position.
    pub position: usize,
    /// Correct answers so far.
    pub score: u32,
    /// Incorrect answers so far.
    pub strikes: u32,
    /// Strike display limit.
    pub max_strikes: u32,
    /// Feedback while a pause is in progress.
    pub feedback: Option<Feedback>,
    /// Progress of the current turn.
    pub progress: Option<Progress>,
    /// Current turn.
    pub turn: Option<TurnView>,
}

impl SessionView {
    /// Builds the view of `session`, resolving its current card in `store`.
    #[must_use]
    pub fn from_session(session: &Session, store: &QuizStore) -> Self {
        let turn = session.current_entry().map(|entry| TurnView {
            scenario_id: entry.scenario_id.clone(),
            scenario_description: entry.scenario_description.clone(),
            slot_id: entry.slot_id.clone(),
            category: entry.category.clone(),
            card_id: entry.card_id.clone(),
            card: store.card(&entry.card_id).cloned(),
        });

        Self {
            session_id: session.id(),
            status: session.status(),
            mode: session.mode(),
            mode_label: session.mode().play_label().to_string(),
            position: session.position(),
            score: session.score(),
            strikes: session.strikes(),
            max_strikes: MAX_STRIKES,
            feedback: session.feedback(),
            progress: session.progress(),
            turn,
        }
    }
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: Config,
    /// Scenario and card data.
    pub store: Arc<QuizStore>,
    /// The session being played.
    pub session: Arc<Mutex<Session>>,
    /// Sink for feedback events.
    pub broadcaster: EventBroadcaster,
}

impl AppState {
    /// Creates the state with a session opened in `mode`.
    #[must_use]
    pub fn new(config: Config, store: QuizStore, mode: Mode) -> Self {
        let session = open_session(&store, mode);
        Self {
            config,
            store: Arc::new(store),
            session: Arc::new(Mutex::new(session)),
            broadcaster: EventBroadcaster::default(),
        }
    }
}

/// Opens a session over the store's full deck.
///
/// With no playable slots the session stays in `loading`.
#[must_use]
pub fn open_session(store: &QuizStore, mode: Mode) -> Session {
    let mut session = Session::new(mode);
    if let Err(e) = session.load(build_deck(store.scenarios())) {
        debug!(session_id = session.id(), error = %e, "Session not ready");
    }
    session
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The session has not finished yet.
    NotFinished(String),
    /// No card with the requested id.
    CardNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFinished(msg) => (StatusCode::CONFLICT, msg),
            Self::CardNotFound(id) => (StatusCode::NOT_FOUND, format!("Card not found: {id}")),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints and the `/ws` stream.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/session", post(handle_start).get(handle_view))
        .route("/session/answer", post(handle_answer))
        .route("/session/summary", get(handle_summary))
        .route("/cards/:id", get(handle_card));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `POST /api/session`.
///
/// Replaces the current session. A pause still running for the old session
/// is dropped when it wakes.
async fn handle_start(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StartQuery>,
) -> Json<SessionView> {
    let mode = Mode::from_param(query.mode.as_deref());
    let fresh = open_session(&state.store, mode);

    let mut session = state.session.lock().await;
    info!(
        old_session = session.id(),
        new_session = fresh.id(),
        mode = %mode,
        "Starting new session"
    );
    *session = fresh;

    state.broadcaster.send(SessionEvent::session_started(
        session.id(),
        mode,
        session.deck().len(),
    ));

    Json(SessionView::from_session(&session, &state.store))
}

/// Handler for `GET /api/session`.
async fn handle_view(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(SessionView::from_session(&session, &state.store))
}

/// Handler for `POST /api/session/answer`.
///
/// Stale submissions are acknowledged `false` and change nothing.
async fn handle_answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Json<AnswerResponse> {
    let mut session = state.session.lock().await;
    let position = session.position();
    let result = session.submit_answer(request.answer);

    if let Some(turn) = result {
        state.broadcaster.send(SessionEvent::answer_feedback(
            session.id(),
            position,
            turn.feedback,
            turn.score,
            turn.strikes,
        ));
        schedule_advance(Arc::clone(&state), session.id());
    }

    Json(AnswerResponse {
        acknowledged: result.is_some(),
        result,
        status: session.status(),
    })
}

/// Handler for `GET /api/session/summary`.
async fn handle_summary(State(state): State<Arc<AppState>>) -> Result<Json<Summary>, ApiError> {
    let session = state.session.lock().await;
    session
        .summary()
        .map(Json)
        .map_err(|e| ApiError::NotFinished(e.to_string()))
}

/// Handler for `GET /api/cards/:id`.
async fn handle_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    state
        .store
        .card(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::CardNotFound(id))
}

/// Applies the pending transition of `session_id` after the feedback delay.
fn schedule_advance(state: Arc<AppState>, session_id: u64) {
    let delay = state.config.feedback_delay();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let mut session = state.session.lock().await;
        if session.id() != session_id {
            debug!(
                session_id,
                current = session.id(),
                "Session replaced during pause, not advancing"
            );
            return;
        }

        match session.advance() {
            Ok(SessionStatus::Finished) => match session.summary() {
                Ok(summary) => {
                    state
                        .broadcaster
                        .send(SessionEvent::session_finished(session_id, summary));
                }
                Err(e) => warn!(session_id, error = %e, "Finished session has no summary"),
            },
            Ok(_) => {
                state
                    .broadcaster
                    .send(SessionEvent::turn_advanced(session_id, session.position()));
            }
            Err(e) => warn!(session_id, error = %e, "Failed to advance session"),
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
