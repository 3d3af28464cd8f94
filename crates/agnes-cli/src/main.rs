//! Agnes CLI - role-play practice for roofing-insurance sales
//!
//! # Usage
//!
//! ```bash
//! # List bundled scenarios
//! agnes scenarios --role homeowner
//!
//! # Score a single response
//! agnes score m9-claim-fear "Filing does not raise your rates and the inspection is free"
//!
//! # Practice interactively
//! agnes practice --role homeowner --persona skeptical --turns 3
//!
//! # Grade a certification exam
//! agnes exam exam.json answers.json
//!
//! # Show version and configuration
//! agnes info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{exam, info, practice, scenarios, score};

/// Agnes - role-play trainer
///
/// Practice insurance-claim conversations against a simulated homeowner,
/// adjuster or colleague and get an explainable score.
#[derive(Parser)]
#[command(
    name = "agnes",
    version,
    about = "Agnes - role-play practice for roofing sales",
    long_about = "Agnes plays a homeowner, adjuster or new rep.\n\n\
                  Answers are scored against each scenario's rubric with\n\
                  transparent key-point matching, no model in the loop."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List practice scenarios
    #[command(name = "scenarios")]
    Scenarios(scenarios::ScenariosArgs),

    /// Score one response against a scenario
    #[command(name = "score")]
    Score(score::ScoreArgs),

    /// Run an interactive role-play session
    #[command(name = "practice")]
    Practice(practice::PracticeArgs),

    /// Grade answers to a certification exam
    #[command(name = "exam")]
    Exam(exam::ExamArgs),

    /// Show version and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Scenarios(args) => scenarios::run(args),
        Commands::Score(args) => score::run(args),
        Commands::Practice(args) => practice::run(args).await,
        Commands::Exam(args) => exam::run(args),
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
