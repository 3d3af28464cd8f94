//! Info command - Show version and configuration
//!
//! Usage:
//! ```bash
//! agnes info
//! ```

use agnes_core::{Role, RubricStore};
use agnes_llm::LlmConfig;
use agnes_roleplay::{Persona, PracticeConfig};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "Agnes - Role-play Trainer".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Bundled Scenarios:".bold());
    match RubricStore::builtin() {
        Ok(store) => {
            for role in Role::ALL {
                let count = store.list_for_role(role).map(|s| s.len()).unwrap_or(0);
                println!("  {} {:<10} {}", "•".cyan(), role.as_str(), count);
            }
        }
        Err(e) => crate::print_error(&format!("Bundled catalog is invalid: {}", e)),
    }
    println!();

    println!("{}", "Personas:".bold());
    for persona in Persona::ALL {
        println!(
            "  {} {:<11} {} (level {})",
            "•".cyan(),
            persona.as_str().green(),
            persona.display_name(),
            persona.difficulty()
        );
    }
    println!();

    let llm = LlmConfig::from_env();
    let practice = PracticeConfig::from_env();
    println!("{}", "Configuration:".bold());
    println!("  {} {}", "Provider:".dimmed(), llm.provider);
    println!("  {} {}", "Model:".dimmed(), llm.model);
    println!(
        "  {} {}",
        "Generative replies:".dimmed(),
        if practice.generative && llm.is_configured() {
            "on".green()
        } else {
            "off (scripted)".yellow()
        }
    );
    println!("  {} {}", "Turns per scenario:".dimmed(), practice.max_turns);
    println!(
        "  {} {}ms",
        "Reply timeout:".dimmed(),
        practice.reply_timeout.as_millis()
    );
    println!("  {} {}", "Persona:".dimmed(), practice.persona);
    println!();

    crate::print_info("Set GEMINI_API_KEY to enable generated replies and coaching");
    println!();

    Ok(())
}
