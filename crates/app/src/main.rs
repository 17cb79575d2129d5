mod commands;
mod shell;

use std::fmt;
use std::io::BufRead;

use exam_core::model::Question;
use exam_core::{ExamReport, ExamSettings, ExamSettingsDraft};
use services::ExamSetup;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::HELP;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--duration <secs>] [--tick-ms <ms>] [--shuffle] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --duration 3600");
    eprintln!("  --tick-ms 1000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DURATION_SECS, RUST_LOG");
}

struct Args {
    settings: ExamSettings,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut draft = ExamSettingsDraft {
            duration_secs: std::env::var("EXAM_DURATION_SECS")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
            ..ExamSettingsDraft::default()
        };
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    draft.duration_secs = Some(parse_number(value, "--duration")?);
                }
                "--tick-ms" => {
                    let value = require_value(args, "--tick-ms")?;
                    draft.tick_interval_ms = Some(parse_number(value, "--tick-ms")?);
                }
                "--shuffle" => draft.shuffle_questions = true,
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg).into()),
            }
        }

        Ok(Self {
            settings: draft.validate()?,
            json,
        })
    }
}

fn demo_questions() -> Vec<Question> {
    vec![
        Question::new(
            "What is the primary function of a transistor in a circuit?",
            ["Amplification", "Rectification", "Filtration", "Insulation"],
            0,
        ),
        Question::new(
            "Which of the following is a non-renewable source of energy?",
            ["Solar", "Wind", "Natural Gas", "Hydroelectric"],
            2,
        ),
        Question::new(
            "In computer science, what does 'FIFO' stand for?",
            [
                "Fast In Fast Out",
                "First In First Out",
                "First In Final Out",
                "Fast In Final Out",
            ],
            1,
        ),
        Question::new(
            "What is the SI unit of electric current?",
            ["Volt", "Ohm", "Ampere", "Watt"],
            2,
        ),
        Question::new(
            "Which protocol is used for sending emails?",
            ["HTTP", "FTP", "SMTP", "SNMP"],
            2,
        ),
    ]
}

fn print_report(report: &ExamReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("Exam Completed ({:?})", report.reason);
    println!(
        "Attempted: {}  In Review: {}  Unseen: {}",
        report.counts.attempted, report.counts.marked_for_review, report.counts.unseen
    );
    println!("Time used: {}s", report.time_used_secs);
    for outcome in &report.questions {
        println!("  Question {:<3} {}", outcome.number, outcome.status.label());
    }
    Ok(())
}

/// Forwards stdin lines from a plain thread.
///
/// A blocking read cannot be cancelled, so it must not hold up the exam loop
/// once the countdown expires. The thread is left behind when `main` returns.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("stdin reader finished");
    });
    rx
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    info!(
        duration_secs = args.settings.duration_secs(),
        shuffle = args.settings.shuffle_questions(),
        "settings loaded"
    );
    let driver = ExamSetup::new(args.settings).build_driver(demo_questions())?;

    println!("{HELP}");
    shell::run_exam(&driver, spawn_stdin_reader()).await?;

    match driver.report() {
        Some(report) => {
            info!(reason = ?report.reason, json = args.json, "printing report");
            print_report(&report, args.json)
        }
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
