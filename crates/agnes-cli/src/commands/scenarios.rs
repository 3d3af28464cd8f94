//! Scenarios command - List the practice catalog
//!
//! Usage:
//! ```bash
//! agnes scenarios
//! agnes scenarios --role adjuster --catalog my-scenarios.json
//! ```

use std::path::PathBuf;

use agnes_core::Role;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::load_store;

/// Arguments for the scenarios command
#[derive(Args)]
pub struct ScenariosArgs {
    /// Only show scenarios for this role (homeowner, adjuster, sales-rep)
    #[arg(short, long)]
    role: Option<Role>,

    /// JSON scenario catalog to use instead of the bundled one
    #[arg(long, env = "AGNES_CATALOG")]
    catalog: Option<PathBuf>,
}

/// Run the scenarios command
pub fn run(args: ScenariosArgs) -> Result<()> {
    let store = load_store(args.catalog.as_deref())?;
    let scenarios = match args.role {
        Some(role) => store.list_for_role(role)?,
        None => store.iter().cloned().collect(),
    };

    println!("{}", "Practice Scenarios".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Opening line").fg(Color::Cyan),
            Cell::new("Key points").fg(Color::Cyan),
            Cell::new("Pass").fg(Color::Cyan),
        ]);

    for scenario in &scenarios {
        table.add_row(vec![
            Cell::new(&scenario.id).fg(Color::Green),
            Cell::new(scenario.role.as_str()),
            Cell::new(&scenario.prompt),
            Cell::new(scenario.expected_key_points.len()),
            Cell::new(scenario.rubric.pass_threshold).fg(Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    println!("Practice: {}", "agnes practice --role <role>".green());
    println!("Score one answer: {}", "agnes score <id> \"<response>\"".green());

    Ok(())
}
