//! Quizdeck session engine
//!
//! Builds a deck from scenario data, runs the yes/no judgement session over
//! it, and serves it to a browser over HTTP and WebSocket.

pub mod api;
pub mod config;
pub mod deck;
pub mod error;
pub mod session;
pub mod store;
pub mod summary;
pub mod websocket;

pub use api::{
    create_router, open_session, AnswerRequest, AnswerResponse, AppState, ErrorResponse,
    SessionView, StartQuery, TurnView,
};
pub use config::{Config, MAX_FEEDBACK_DELAY_MS};
pub use deck::{build_deck, Deck, DeckEntry};
pub use error::{QuizError, Result};
pub use session::{
    should_finish, AnswerRecord, Feedback, Mode, Progress, Session, SessionState, SessionStatus,
    TurnResult, MAX_STRIKES,
};
pub use store::{Card, CardContent, QuizStore, Scenario, Slot};
pub use summary::{passing_score, Summary, ThresholdRule, Verdict};
pub use websocket::{EventBroadcaster, SessionEvent};
