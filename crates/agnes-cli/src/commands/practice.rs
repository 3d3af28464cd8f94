//! Practice command - Interactive role-play in the terminal
//!
//! Usage:
//! ```bash
//! agnes practice --role homeowner
//! agnes practice --role adjuster --persona final-boss --turns 3 --export session.json
//! ```
//!
//! Commands while playing: /hint, /retry, /transcript, /help, /quit

use std::io::{self, Write};
use std::path::PathBuf;

use agnes_core::{analyze_confidence, analyze_tone, Role};
use agnes_llm::LlmConfig;
use agnes_roleplay::{
    CoachFeedback, ConversationError, Persona, PracticeConfig, PracticeSession, SessionError,
    TextSource, TurnOutcome, COUNTERPART_NAME,
};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::{colored_score, load_store, print_breakdown};

/// Arguments for the practice command
#[derive(Args)]
pub struct PracticeArgs {
    /// Who Agnes plays (homeowner, adjuster, sales-rep)
    #[arg(short, long, default_value = "homeowner")]
    role: Role,

    /// Counterpart persona (supportive, realistic, skeptical, rushed, final-boss)
    #[arg(short, long)]
    persona: Option<Persona>,

    /// Turns per scenario (1-10)
    #[arg(short, long)]
    turns: Option<u32>,

    /// Never call the LLM, even when one is configured
    #[arg(long)]
    scripted: bool,

    /// Write every archived attempt to this JSON file at the end
    #[arg(long)]
    export: Option<PathBuf>,

    /// JSON scenario catalog to use instead of the bundled one
    #[arg(long, env = "AGNES_CATALOG")]
    catalog: Option<PathBuf>,
}

/// What the user chose after an attempt
enum AfterAttempt {
    Next,
    Retry,
    Quit,
}

/// Run the practice command
pub async fn run(args: PracticeArgs) -> Result<()> {
    let store = load_store(args.catalog.as_deref())?;

    let mut config = PracticeConfig::from_env();
    if let Some(persona) = args.persona {
        config = config.with_persona(persona);
    }
    if let Some(turns) = args.turns {
        config = config.with_max_turns(turns);
    }
    if args.scripted {
        config = config.scripted();
    }

    let provider = if config.generative {
        LlmConfig::from_env().build_provider().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "No generative provider; using scripted replies");
            None
        })
    } else {
        None
    };
    let generative = provider.is_some();

    let mut session = PracticeSession::start(&store, args.role, &config, provider)
        .with_context(|| format!("Cannot start a {} session", args.role))?;

    println!();
    println!("{}", "Agnes Role-play Practice".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!(
        "  {} {}   {} {}   {} {}",
        "Role:".dimmed(),
        args.role.as_str().green(),
        "Persona:".dimmed(),
        config.persona.display_name().green(),
        "Turns:".dimmed(),
        config.max_turns
    );
    if !generative {
        crate::print_info("Scripted replies (no LLM configured)");
    }
    println!("  Commands: /hint, /retry, /transcript, /help, /quit");

    while let Some(scenario) = session.current_scenario().cloned() {
        let (position, total) = session.position();
        println!();
        println!(
            "{} {}",
            format!("Scenario {}/{}:", position, total).bold(),
            scenario.id.green()
        );
        println!("{} {}", format!("{}:", COUNTERPART_NAME).magenta().bold(), scenario.prompt);

        match play_attempt(&mut session).await? {
            AfterAttempt::Next => {
                session.next()?;
            }
            AfterAttempt::Retry => {
                session.retry()?;
                crate::print_info("Starting this scenario over");
            }
            AfterAttempt::Quit => {
                // Keep a finished attempt in the summary
                if session.conversation().is_some_and(|c| c.is_concluded()) {
                    session.next()?;
                }
                break;
            }
        }
    }

    print_summary(&session);

    if let Some(path) = &args.export {
        let json = serde_json::to_string_pretty(session.tracker().attempts())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        crate::print_success(&format!("Session exported to {}", path.display()));
    }

    Ok(())
}

/// Play one attempt until it concludes or the user bails out
async fn play_attempt(session: &mut PracticeSession) -> Result<AfterAttempt> {
    loop {
        let turn = session
            .conversation()
            .map(|c| c.current_turn())
            .unwrap_or(1);
        let Some(input) = read_line(&format!("You ({}/{}): ", turn, session.max_turns()))? else {
            return Ok(AfterAttempt::Quit);
        };

        match input.as_str() {
            "/quit" | "/exit" | "/q" => return Ok(AfterAttempt::Quit),
            "/retry" => return Ok(AfterAttempt::Retry),
            "/help" => {
                println!("  /hint        Show a coaching hint");
                println!("  /retry       Start this scenario over");
                println!("  /transcript  Show the conversation so far");
                println!("  /quit        End the session");
                continue;
            }
            "/hint" => {
                match session.hint() {
                    Some(hint) => println!("  {} {}", "Hint:".yellow().bold(), hint),
                    None => crate::print_warning("No hints available for this scenario"),
                }
                continue;
            }
            "/transcript" => {
                if let Some(conversation) = session.conversation() {
                    println!("{}", conversation.transcript_text().dimmed());
                }
                continue;
            }
            _ => {}
        }

        match session.submit(&input).await {
            Ok(TurnOutcome::Continue { reply, .. }) => {
                let name = format!("{}:", COUNTERPART_NAME);
                let marker = match reply.source {
                    TextSource::Generated => "",
                    TextSource::Scripted => " ·",
                };
                println!("{}{} {}", name.magenta().bold(), marker.dimmed(), reply.text);
            }
            Ok(TurnOutcome::Concluded { result, feedback }) => {
                let scored = scored_text(session, &input);
                println!();
                println!("{} {}", "Score:".bold(), colored_score(&result));
                print_breakdown(&result);
                println!(
                    "  {} {}   {} {}%",
                    "Tone:".dimmed(),
                    analyze_tone(&scored).label(),
                    "Confidence:".dimmed(),
                    analyze_confidence(&scored)
                );
                print_feedback(&feedback);
                return ask_after_attempt();
            }
            Err(SessionError::Conversation(ConversationError::EmptySubmission)) => {
                crate::print_warning("Please type a response");
            }
            Err(e) => crate::print_error(&e.to_string()),
        }
    }
}

/// Everything the user said this attempt, which is what the score covers
fn scored_text(session: &PracticeSession, last_input: &str) -> String {
    session
        .conversation()
        .map(|c| c.user_text())
        .unwrap_or_else(|| last_input.to_string())
}

fn ask_after_attempt() -> Result<AfterAttempt> {
    loop {
        let Some(choice) = read_line("[n]ext, [r]etry or [q]uit? ")? else {
            return Ok(AfterAttempt::Quit);
        };
        match choice.to_lowercase().as_str() {
            "n" | "next" | "" => return Ok(AfterAttempt::Next),
            "r" | "retry" => return Ok(AfterAttempt::Retry),
            "q" | "quit" => return Ok(AfterAttempt::Quit),
            _ => continue,
        }
    }
}

fn print_feedback(feedback: &CoachFeedback) {
    println!();
    println!("{}", "Strengths:".bold());
    for item in &feedback.strengths {
        println!("  {} {}", "+".green(), item);
    }
    println!("{}", "To improve:".bold());
    for item in &feedback.improvements {
        println!("  {} {}", "→".yellow(), item);
    }
    println!();
}

fn print_summary(session: &PracticeSession) {
    let summary = session.summary();
    println!();
    println!("{}", "Session Summary".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    if summary.count == 0 {
        println!("  No completed scenarios.");
        return;
    }
    println!("  {} {}", "Scenarios completed:".dimmed(), summary.count);
    println!("  {} {}", "Average score:".dimmed(), summary.average);
    println!("  {} {}", "Best score:".dimmed(), summary.max);
    println!(
        "  {} {}/{}",
        "Passed:".dimmed(),
        summary.pass_count,
        summary.count
    );
    println!("  {} {}", "Hints used:".dimmed(), session.hints_used());
}

/// Prompt and read one trimmed line; `None` on end of input
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt.bold());
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    if read == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
