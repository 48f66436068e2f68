//! End-to-end tests for a session played over the fixture data.
//!
//! The fixture deck has two scenarios with two slots each. Ground truth in
//! deck order is: true, false, true, false. The last card is missing from
//! the card file.

use std::path::{Path, PathBuf};

use quizdeck_report::{json::JsonGenerator, MarkdownGenerator, Report};
use quizdeck_session::{
    build_deck, passing_score, Config, Mode, QuizError, QuizStore, Session, SessionStatus, Verdict,
};

const TRUTH: [bool; 4] = [true, false, true, false];

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn load_store() -> QuizStore {
    QuizStore::load(&fixture("scenarios.json"), &fixture("cards.json"))
        .expect("fixture data should load")
}

fn start(mode: Mode) -> Session {
    Session::start(build_deck(load_store().scenarios()), mode).expect("fixture deck is not empty")
}

/// Submits `answer` and applies the transition right away.
fn play(session: &mut Session, answer: bool) {
    session
        .submit_answer(answer)
        .expect("session should accept an answer");
    session.advance().expect("answer should be pending");
}

#[test]
fn test_fixture_config_loads() {
    let config = Config::load_from_file(&fixture("quizdeck.json")).expect("config should parse");
    assert_eq!(config.scenarios, "fixtures/scenarios.json");
    assert_eq!(config.feedback_delay_ms, 20);
}

#[test]
fn test_fixture_deck_matches_nesting() {
    let store = load_store();
    let deck = build_deck(store.scenarios());

    assert_eq!(deck.len(), 4);
    assert_eq!(deck.scenario_count(), 2);
    let truth: Vec<bool> = deck.iter().map(|e| e.is_correct).collect();
    assert_eq!(truth, TRUTH);
    let slots: Vec<&str> = deck.iter().map(|e| e.slot_id.as_str()).collect();
    assert_eq!(
        slots,
        vec![
            "acceleration-graph",
            "velocity-statement",
            "force-statement",
            "position-graph"
        ]
    );
}

#[test]
fn test_missing_card_is_tolerated() {
    let store = load_store();
    let deck = build_deck(store.scenarios());

    let last = deck.get(3).expect("deck has four entries");
    assert!(store.card(&last.card_id).is_none());
    assert!(store.card("graph-accel-constant").is_some_and(|c| c.is_image()));
}

#[test]
fn test_two_right_two_wrong_student_fails() {
    let mut session = start(Mode::Student);

    // correct, correct, incorrect, incorrect
    play(&mut session, TRUTH[0]);
    play(&mut session, TRUTH[1]);
    play(&mut session, !TRUTH[2]);
    assert!(!session.is_terminated());
    play(&mut session, !TRUTH[3]);

    assert!(session.is_terminated());
    assert_eq!(session.score(), 2);
    assert_eq!(session.strikes(), 2);

    let summary = session.summary().expect("session is finished");
    assert_eq!(summary.total_questions, 4);
    assert_eq!(passing_score(4), 4);
    assert_eq!(
        summary.verdict,
        Verdict::Graded {
            passing_score: 4,
            rule: quizdeck_session::ThresholdRule::Scaled,
            passed: false,
        }
    );
    assert!(summary.to_string().contains("Result: Try again"));
}

#[test]
fn test_perfect_student_passes() {
    let mut session = start(Mode::Student);
    for answer in TRUTH {
        play(&mut session, answer);
    }

    let summary = session.summary().expect("session is finished");
    assert_eq!(summary.score, 4);
    assert_eq!(summary.passed(), Some(true));
}

#[test]
fn test_student_third_strike_ends_early() {
    let mut session = start(Mode::Student);
    play(&mut session, !TRUTH[0]);
    play(&mut session, !TRUTH[1]);

    let result = session
        .submit_answer(!TRUTH[2])
        .expect("third answer accepted");
    assert!(result.finished);
    assert_eq!(session.advance().expect("pending"), SessionStatus::Finished);
    assert_eq!(session.history().len(), 3);
    assert_eq!(session.summary().expect("finished").strikes, 3);
}

#[test]
fn test_teacher_plays_whole_deck() {
    let mut session = start(Mode::Teacher);
    for answer in TRUTH {
        assert!(!session.is_terminated());
        play(&mut session, !answer);
    }

    assert!(session.is_terminated());
    let summary = session.summary().expect("finished");
    assert_eq!(summary.strikes, 4);
    assert_eq!(summary.verdict, Verdict::NoRequirement);
    assert!(summary
        .lines()
        .contains(&"Mode: Teacher (practice mode)".to_string()));
}

#[test]
fn test_finished_session_is_immutable() {
    let mut session = start(Mode::Student);
    for answer in TRUTH {
        play(&mut session, answer);
    }

    let state = session.state();
    assert!(session.submit_answer(true).is_none());
    assert!(session.submit_answer(false).is_none());
    assert!(matches!(
        session.advance(),
        Err(QuizError::InvalidStateTransition { .. })
    ));
    assert_eq!(session.state(), state);
}

#[test]
fn test_reports_from_finished_session() {
    let mut session = start(Mode::Student);
    for answer in TRUTH {
        play(&mut session, answer);
    }

    let report = Report::from_session(&session).expect("report builds");
    assert_eq!(report.answered(), 4);

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("| 4 | level-cart | position-graph | graph-position-parabola | No | Correct |"));

    let dir = std::env::temp_dir().join("quizdeck_integration_reports");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("quizdeck-report.json");
    JsonGenerator::new(&report)
        .write_to_file(&path, true)
        .expect("report written");
    let written: Report =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("readable")).expect("parses");
    assert_eq!(written.summary, report.summary);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_empty_scenarios_stay_loading() {
    let mut session = Session::new(Mode::Student);
    let err = session
        .load(build_deck(&[]))
        .expect_err("empty deck is not ready");
    assert!(matches!(err, QuizError::EmptyDeck));
    assert!(!err.is_fatal());
    assert_eq!(session.status(), SessionStatus::Loading);
}
