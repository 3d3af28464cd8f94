//! Subcommands and the helpers they share

pub mod exam;
pub mod info;
pub mod practice;
pub mod scenarios;
pub mod score;

use std::path::Path;

use agnes_core::{RubricStore, ScoreBand, ScoreResult};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

/// Bundled catalog, or the JSON catalog at `path`
pub fn load_store(path: Option<&Path>) -> Result<RubricStore> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog {}", path.display()))?;
            RubricStore::from_json(&json)
                .with_context(|| format!("Invalid catalog {}", path.display()))
        }
        None => RubricStore::builtin().context("Bundled catalog is invalid"),
    }
}

/// Score colored by band
pub fn colored_score(result: &ScoreResult) -> ColoredString {
    let text = format!("{}/100", result.score);
    match result.band() {
        ScoreBand::High => text.green().bold(),
        ScoreBand::Medium => text.yellow().bold(),
        ScoreBand::Low => text.red().bold(),
    }
}

/// Matched and missed key points, one per line
pub fn print_breakdown(result: &ScoreResult) {
    for point in &result.matched_points {
        println!("  {} {}", "✓".green(), point);
    }
    for point in &result.missed_points {
        println!("  {} {}", "✗".red(), point.dimmed());
    }
    if !result.keyword_hits.is_empty() {
        println!(
            "  {} {}",
            "Keywords:".dimmed(),
            result.keyword_hits.join(", ").cyan()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_catalog() {
        let store = load_store(None).unwrap();
        assert!(!store.is_empty());
    }

    #[test]
    fn test_missing_catalog_is_error() {
        let err = load_store(Some(Path::new("/nonexistent/catalog.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read catalog"));
    }
}
