//! Quizdeck CLI
//!
//! Plays a quiz session in the terminal, or serves it to a browser with
//! `--serve`.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use quizdeck_report::{
    json::JsonGenerator, MarkdownGenerator, Report, JSON_REPORT_FILE, MARKDOWN_REPORT_FILE,
};
use quizdeck_session::{
    build_deck, create_router, AppState, Card, CardContent, Config, Feedback, Mode, QuizError,
    QuizStore, Session, TurnResult,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::time::{timeout_at, Instant};
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Quizdeck - judge physics cards against scenarios
///
/// Each turn shows a scenario and one card. Answer whether the card
/// correctly represents the scenario.
#[derive(Parser, Debug)]
#[command(name = "quizdeck")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: quizdeck.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Session mode: "teacher" for practice, anything else plays as student
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Serve the session over HTTP instead of playing in the terminal
    #[arg(long)]
    serve: bool,

    /// Port for the HTTP API server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

/// One line of terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Answer(bool),
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Self::Answer(true),
            "n" | "no" => Self::Answer(false),
            "q" | "quit" => Self::Quit,
            _ => Self::Unknown,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("quizdeck starting");
    tracing::debug!(config = ?args.config, mode = ?args.mode, "Launch parameters");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let store = QuizStore::load(Path::new(&config.scenarios), Path::new(&config.cards))?;
    println!(
        "Loaded {} scenarios and {} cards",
        store.scenario_count(),
        store.cards().len()
    );

    let mode = Mode::from_param(args.mode.as_deref());

    if args.serve {
        serve(config, store, mode, args.port).await
    } else {
        play(&config, &store, mode).await
    }
}

/// Serves the session until Ctrl+C, then reports on it if it finished.
async fn serve(config: Config, store: QuizStore, mode: Mode, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    println!();
    println!("Starting HTTP API server on {addr}...");

    let output_dir = config.output_dir.clone();
    let state = AppState::new(config, store, mode);
    let session = Arc::clone(&state.session);
    let router = create_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!();
    println!("Server stopped");

    let session = session.lock().await;
    if session.is_terminated() {
        print_summary(&session)?;
        generate_reports(&session, Path::new(&output_dir))?;
    } else {
        println!("Session not finished ({}), no report written", session.status());
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
}

/// Plays one session in the terminal.
async fn play(config: &Config, store: &QuizStore, mode: Mode) -> anyhow::Result<()> {
    let mut session = match Session::start(build_deck(store.scenarios()), mode) {
        Ok(session) => session,
        Err(QuizError::EmptyDeck) => {
            println!();
            println!("No scenarios found. The game is not ready.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("{}", mode.play_label());
    println!("Answer each card with y (correct) or n (incorrect). q quits.");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let delay = config.feedback_delay();

    while !session.is_terminated() {
        print_turn(&session, store);

        let Some(line) = input.next_line().await? else {
            println!();
            println!("Input closed before the session finished");
            return Ok(());
        };

        let answer = match Input::parse(&line) {
            Input::Answer(answer) => answer,
            Input::Quit => {
                println!("Quitting, session not finished");
                return Ok(());
            }
            Input::Unknown => {
                println!("Please answer y or n");
                continue;
            }
        };

        let Some(result) = session.submit_answer(answer) else {
            continue;
        };
        print_feedback(&result);

        hold_feedback(&mut session, &mut input, delay).await?;
        session.advance()?;
    }

    println!();
    print_summary(&session)?;
    generate_reports(&session, Path::new(&config.output_dir))?;

    Ok(())
}

/// Waits out the feedback pause. Answers typed meanwhile reach the session
/// and are dropped there.
async fn hold_feedback<R>(
    session: &mut Session,
    input: &mut Lines<R>,
    delay: Duration,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let deadline = Instant::now() + delay;
    loop {
        match timeout_at(deadline, input.next_line()).await {
            Err(_) => return Ok(()),
            Ok(Ok(Some(line))) => {
                if let Input::Answer(answer) = Input::parse(&line) {
                    if session.submit_answer(answer).is_none() {
                        tracing::debug!("Answer ignored during feedback pause");
                    }
                }
            }
            Ok(Ok(None)) => {
                tokio::time::sleep_until(deadline).await;
                return Ok(());
            }
            Ok(Err(e)) => return Err(e.into()),
        }
    }
}

fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Scenarios: {}", config.scenarios);
    println!("  Cards: {}", config.cards);
    println!("  Feedback delay: {}ms", config.feedback_delay_ms);
    println!("  Output directory: {}", config.output_dir);
}

fn print_turn(session: &Session, store: &QuizStore) {
    let (Some(entry), Some(progress)) = (session.current_entry(), session.progress()) else {
        return;
    };

    println!();
    println!(
        "Question {} / {} ({}%)  Scenario {} / {}  {}",
        progress.question,
        progress.total,
        progress.percent,
        progress.scenario,
        progress.scenario_total,
        session.strikes_label()
    );
    println!("Scenario: {}", entry.scenario_description);
    println!("Card ({}): {}", entry.category, describe_card(store.card(&entry.card_id)));
    println!("Is this card correct? [y/n]");
}

fn describe_card(card: Option<&Card>) -> String {
    match card.map(|c| &c.content) {
        Some(CardContent::Text { text }) => text.clone(),
        Some(CardContent::Image { asset }) => format!("[image: {asset}]"),
        None => "[card unavailable]".to_string(),
    }
}

fn print_feedback(result: &TurnResult) {
    match result.feedback {
        Feedback::Correct => println!("Correct!"),
        Feedback::Incorrect => println!("Incorrect."),
    }
}

fn print_summary(session: &Session) -> anyhow::Result<()> {
    let summary = session.summary()?;
    println!("Session complete");
    for line in summary.lines() {
        println!("  {line}");
    }
    Ok(())
}

fn generate_reports(session: &Session, output_dir: &Path) -> anyhow::Result<()> {
    println!();
    println!("Generating reports...");

    let report = Report::from_session(session)?;

    std::fs::create_dir_all(output_dir)?;

    let md_path = output_dir.join(MARKDOWN_REPORT_FILE);
    std::fs::write(&md_path, MarkdownGenerator::new(&report).generate())?;
    println!("  Markdown report: {}", md_path.display());

    let json_path = output_dir.join(JSON_REPORT_FILE);
    JsonGenerator::new(&report).write_to_file(&json_path, true)?;
    println!("  JSON report: {}", json_path.display());

    Ok(())
}
