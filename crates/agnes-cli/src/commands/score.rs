//! Score command - Score one response against a scenario rubric
//!
//! Usage:
//! ```bash
//! agnes score m9-claim-fear "The inspection is free and filing won't raise your rates"
//! agnes score m9-claim-fear "..." --json
//! ```

use std::path::PathBuf;

use agnes_core::{analyze_live, Scorer, ScoringConfig};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{colored_score, load_store, print_breakdown};

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Scenario id (see `agnes scenarios`)
    scenario: String,

    /// The response to score
    response: String,

    /// Exact phrase matching only, no keyword bonus
    #[arg(long)]
    strict: bool,

    /// Output the score result as JSON
    #[arg(long)]
    json: bool,

    /// JSON scenario catalog to use instead of the bundled one
    #[arg(long, env = "AGNES_CATALOG")]
    catalog: Option<PathBuf>,
}

/// Run the score command
pub fn run(args: ScoreArgs) -> Result<()> {
    let store = load_store(args.catalog.as_deref())?;
    let scenario = store.get(&args.scenario)?;
    let scorer = Scorer::new(if args.strict {
        ScoringConfig::strict()
    } else {
        ScoringConfig::default()
    });

    let result = scorer.score_scenario(&args.response, &scenario);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} {}", "Scenario:".dimmed(), scenario.id.green());
    println!("{} {}", "Prompt:".dimmed(), scenario.prompt);
    println!();
    println!("{} {}", "Score:".bold(), colored_score(&result));
    print_breakdown(&result);

    if let Some(live) = analyze_live(&args.response, &scenario, &scorer) {
        println!();
        println!(
            "  {} {}   {} {}%   {} {}",
            "Tone:".dimmed(),
            live.tone.label(),
            "Confidence:".dimmed(),
            live.confidence,
            "Words:".dimmed(),
            live.word_count
        );
    }
    println!();

    if result.passed {
        crate::print_success(&format!(
            "Passed (threshold {})",
            scenario.rubric.pass_threshold
        ));
    } else {
        crate::print_warning(&format!(
            "Below pass threshold ({} < {})",
            result.score, scenario.rubric.pass_threshold
        ));
    }
    Ok(())
}
