//! WebSocket feedback events.
//!
//! Connected clients receive a `connected` event with the current session
//! view, then every event broadcast by the HTTP handlers. `answer_feedback`
//! is the cue a browser plays a sound or highlights the card on.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes the session view
//! - `session_started` - A fresh session was opened
//! - `answer_feedback` - An answer was accepted (correct or incorrect)
//! - `turn_advanced` - The feedback pause ended and the next turn is shown
//! - `session_finished` - The session ended, includes the summary

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::{AppState, SessionView};
use crate::session::{Feedback, Mode};
use crate::summary::Summary;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The session as the client should render it.
    pub session: SessionView,
}

/// Payload for the `session_started` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedPayload {
    /// The new session.
    pub session_id: u64,
    /// Its mode.
    pub mode: Mode,
    /// Deck length (0 while not ready).
    pub total_questions: usize,
}

/// Payload for the `answer_feedback` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedbackPayload {
    /// Session the answer belongs to.
    pub session_id: u64,
    /// Deck position of the answered turn.
    pub position: usize,
    /// Outcome to cue.
    pub feedback: Feedback,
    /// Score after the answer.
    pub score: u32,
    /// Strikes after the answer.
    pub strikes: u32,
}

/// Payload for the `turn_advanced` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnAdvancedPayload {
    /// Session that advanced.
    pub session_id: u64,
    /// New deck position.
    pub position: usize,
}

/// Payload for the `session_finished` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFinishedPayload {
    /// Session that finished.
    pub session_id: u64,
    /// Final summary.
    pub summary: Summary,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Session events pushed to WebSocket clients.
///
/// Serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sent when a client connects.
    Connected(ConnectedPayload),
    /// Sent when a session is opened.
    SessionStarted(SessionStartedPayload),
    /// Sent when an answer is accepted.
    AnswerFeedback(AnswerFeedbackPayload),
    /// Sent when the next turn is shown.
    TurnAdvanced(TurnAdvancedPayload),
    /// Sent when the session ends.
    SessionFinished(SessionFinishedPayload),
}

impl SessionEvent {
    /// Creates a `Connected` event.
    #[must_use]
    pub const fn connected(session: SessionView) -> Self {
        Self::Connected(ConnectedPayload { session })
    }

    /// Creates a `SessionStarted` event.
    #[must_use]
    pub const fn session_started(session_id: u64, mode: Mode, total_questions: usize) -> Self {
        Self::SessionStarted(SessionStartedPayload {
            session_id,
            mode,
            total_questions,
        })
    }

    /// Creates an `AnswerFeedback` event.
    #[must_use]
    pub const fn answer_feedback(
        session_id: u64,
        position: usize,
        feedback: Feedback,
        score: u32,
        strikes: u32,
    ) -> Self {
        Self::AnswerFeedback(AnswerFeedbackPayload {
            session_id,
            position,
            feedback,
            score,
            strikes,
        })
    }

    /// Creates a `TurnAdvanced` event.
    #[must_use]
    pub const fn turn_advanced(session_id: u64, position: usize) -> Self {
        Self::TurnAdvanced(TurnAdvancedPayload {
            session_id,
            position,
        })
    }

    /// Creates a `SessionFinished` event.
    #[must_use]
    pub const fn session_finished(session_id: u64, summary: Summary) -> Self {
        Self::SessionFinished(SessionFinishedPayload {
            session_id,
            summary,
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::SessionStarted(_) => "session_started",
            Self::AnswerFeedback(_) => "answer_feedback",
            Self::TurnAdvanced(_) => "turn_advanced",
            Self::SessionFinished(_) => "session_finished",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all connected WebSocket clients.
///
/// Events are not kept for clients that connect later.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with a per-subscriber buffer of `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event; returns how many subscribers will receive it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a single WebSocket connection.
///
/// Sends `connected` first, then forwards broadcast events and keeps a
/// ping/pong heartbeat.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the view so no event slips between the two.
    let mut event_receiver = state.broadcaster.subscribe();

    let view = {
        let session = state.session.lock().await;
        SessionView::from_session(&session, &state.store)
    };

    let connected_json = match serde_json::to_string(&SessionEvent::connected(view)) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize connected event: {}", e);
            return;
        }
    };

    if sender.send(Message::Text(connected_json)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected, sent session view");

    let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested close");
                        break;
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        debug!("Ignoring message from client");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            event = event_receiver.recv() => {
                match event {
                    Ok(session_event) => {
                        let json = match serde_json::to_string(&session_event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("Failed to send event, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Broadcaster closed");
                        break;
                    }
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!("Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!("Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
