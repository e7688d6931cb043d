//! Napper CLI - Command-line interface for the Napper engine
//!
//! Commands:
//! - predict: Full prediction bundle for a subject
//! - wake-windows: Day and night wake-window statistics
//! - feeding-intervals: Interval statistics per feed category
//! - insights: Daily insights for a calendar date
//! - validate: Check a history snapshot for malformed episodes

use chrono::{DateTime, FixedOffset, Local};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use napper_engine::history::{EventHistory, HistorySnapshot};
use napper_engine::pipeline::{parse_date, parse_reference_time, parse_subject_id};
use napper_engine::{EngineConfig, EngineError, PredictionEngine, ENGINE_VERSION};

/// Napper - Sleep and feeding predictions from logged infant events
#[derive(Parser)]
#[command(name = "napper")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Predict infant sleep and feeding from event history", long_about = None)]
struct Cli {
    /// Engine configuration JSON file (missing fields take defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print compact JSON even when stdout is a terminal
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full prediction bundle: next sleep, next feeds, today's insights
    Predict {
        #[command(flatten)]
        target: Target,

        /// Reference time, RFC 3339 (defaults to the local clock)
        #[arg(long)]
        now: Option<String>,
    },

    /// Wake-window statistics for the day and night clusters
    WakeWindows {
        #[command(flatten)]
        target: Target,

        /// Reference time used for the history window
        #[arg(long)]
        now: Option<String>,
    },

    /// Feeding-interval statistics per category
    FeedingIntervals {
        #[command(flatten)]
        target: Target,

        /// Reference time used for the history window
        #[arg(long)]
        now: Option<String>,
    },

    /// Same-day insights over the full history
    Insights {
        #[command(flatten)]
        target: Target,

        /// Calendar date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Validate a history snapshot
    Validate {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Snapshot file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Subject id; may be omitted when the snapshot holds a single subject
    #[arg(long)]
    subject: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), NapperCliError> {
    let engine = match &cli.config {
        Some(path) => PredictionEngine::from_config_json(&fs::read_to_string(path)?)?,
        None => PredictionEngine::with_config(EngineConfig::default())?,
    };
    let pretty = !cli.compact && atty::is(atty::Stream::Stdout);

    match cli.command {
        Commands::Predict { target, now } => {
            let (snapshot, subject_id) = load_target(&target)?;
            let now = reference_time(now.as_deref())?;
            let bundle = engine.predict_for_subject(&snapshot, subject_id, &now)?;
            emit(&bundle, pretty)
        }

        Commands::WakeWindows { target, now } => {
            let (snapshot, subject_id) = load_target(&target)?;
            let since = history_start(&engine, now.as_deref())?;
            let sleep = snapshot.sleep_episodes(subject_id, Some(since))?;
            emit(&engine.wake_window_summary(&sleep), pretty)
        }

        Commands::FeedingIntervals { target, now } => {
            let (snapshot, subject_id) = load_target(&target)?;
            let since = history_start(&engine, now.as_deref())?;
            let feeding = snapshot.feeding_episodes(subject_id, Some(since))?;
            emit(&engine.feeding_interval_summary(&feeding), pretty)
        }

        Commands::Insights { target, date } => {
            let (snapshot, subject_id) = load_target(&target)?;
            let date = match date {
                Some(value) => parse_date(&value)?,
                None => Local::now().date_naive(),
            };
            let sleep = snapshot.sleep_episodes(subject_id, None)?;
            let feeding = snapshot.feeding_episodes(subject_id, None)?;
            emit(&engine.daily_insights(date, &sleep, &feeding), pretty)
        }

        Commands::Validate { input } => cmd_validate(&input, pretty),
    }
}

fn cmd_validate(input: &Path, pretty: bool) -> Result<(), NapperCliError> {
    let snapshot = read_snapshot(input)?;
    let result = snapshot.validate();

    let report = ValidationReport {
        subjects: snapshot.subjects.len(),
        sleep_episodes: snapshot.sleep.len(),
        feeding_episodes: snapshot.feeding.len(),
        valid: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };
    emit(&report, pretty)?;

    result.map_err(NapperCliError::from)
}

fn read_input(input: &Path) -> Result<String, NapperCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_snapshot(input: &Path) -> Result<HistorySnapshot, NapperCliError> {
    Ok(HistorySnapshot::from_json(&read_input(input)?)?)
}

/// Load and validate a snapshot, and resolve which subject to report on
fn load_target(target: &Target) -> Result<(HistorySnapshot, Uuid), NapperCliError> {
    let snapshot = read_snapshot(&target.input)?;
    snapshot.validate()?;

    let subject_id = match (&target.subject, snapshot.subjects.as_slice()) {
        (Some(id), _) => parse_subject_id(id)?,
        (None, [only]) => only.id,
        (None, subjects) => return Err(NapperCliError::AmbiguousSubject(subjects.len())),
    };
    Ok((snapshot, subject_id))
}

fn reference_time(now: Option<&str>) -> Result<DateTime<FixedOffset>, NapperCliError> {
    match now {
        Some(value) => Ok(parse_reference_time(value)?),
        None => Ok(DateTime::<FixedOffset>::from(Local::now())),
    }
}

fn history_start(
    engine: &PredictionEngine,
    now: Option<&str>,
) -> Result<DateTime<FixedOffset>, NapperCliError> {
    Ok(engine.config().history_start(&reference_time(now)?)?)
}

fn emit<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), NapperCliError> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

// Error handling

enum NapperCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    AmbiguousSubject(usize),
}

impl From<io::Error> for NapperCliError {
    fn from(e: io::Error) -> Self {
        NapperCliError::Io(e)
    }
}

impl From<EngineError> for NapperCliError {
    fn from(e: EngineError) -> Self {
        NapperCliError::Engine(e)
    }
}

impl From<serde_json::Error> for NapperCliError {
    fn from(e: serde_json::Error) -> Self {
        NapperCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NapperCliError> for CliError {
    fn from(e: NapperCliError) -> Self {
        match e {
            NapperCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            NapperCliError::Engine(e) => {
                let (code, hint) = match &e {
                    EngineError::InvalidHistory(_) => {
                        ("INVALID_HISTORY", "Run 'napper validate' for details")
                    }
                    EngineError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Check the values in the --config file")
                    }
                    EngineError::SubjectNotFound(_) => {
                        ("SUBJECT_NOT_FOUND", "Check the --subject id against the snapshot")
                    }
                    EngineError::DateParseError(_) => {
                        ("DATE_ERROR", "Use RFC 3339 for --now and YYYY-MM-DD for --date")
                    }
                    EngineError::JsonError(_) | EngineError::ParseError(_) => {
                        ("PARSE_ERROR", "Ensure input is a history snapshot JSON object")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            NapperCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            NapperCliError::AmbiguousSubject(count) => CliError {
                code: "AMBIGUOUS_SUBJECT".to_string(),
                message: format!("Snapshot holds {count} subjects"),
                hint: Some("Pass --subject to choose one".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    subjects: usize,
    sleep_episodes: usize,
    feeding_episodes: usize,
    valid: bool,
    error: Option<String>,
}
