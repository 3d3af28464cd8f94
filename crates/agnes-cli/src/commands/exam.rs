//! Exam command - Grade answers against a certification exam
//!
//! Usage:
//! ```bash
//! agnes exam exam.json answers.json
//! agnes exam exam.json answers.json --pass 80
//! ```
//!
//! `answers.json` is a JSON array of strings, one per exam item in order:
//! multiple choice first, then fill-in-the-blank, then short answer.

use std::path::PathBuf;

use agnes_core::{Exam, ExamItem};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

/// Arguments for the exam command
#[derive(Args)]
pub struct ExamArgs {
    /// Exam definition (JSON)
    exam: PathBuf,

    /// Answers (JSON array of strings)
    answers: PathBuf,

    /// Overall percentage needed to pass
    #[arg(long, default_value_t = 70)]
    pass: u8,
}

/// Run the exam command
pub fn run(args: ExamArgs) -> Result<()> {
    let exam_json = std::fs::read_to_string(&args.exam)
        .with_context(|| format!("Failed to read exam {}", args.exam.display()))?;
    let exam = Exam::from_json(&exam_json)
        .with_context(|| format!("Invalid exam {}", args.exam.display()))?;

    let answers_json = std::fs::read_to_string(&args.answers)
        .with_context(|| format!("Failed to read answers {}", args.answers.display()))?;
    let answers: Vec<String> = serde_json::from_str(&answers_json)
        .context("Answers must be a JSON array of strings")?;

    if answers.len() != exam.items().len() {
        crate::print_warning(&format!(
            "{} answers for {} questions; missing answers count as wrong",
            answers.len(),
            exam.items().len()
        ));
    }

    let grade = exam.grade(&answers);

    println!("{}", "Certification Exam".bold().cyan());
    println!("{}", "═".repeat(40).cyan());
    for (i, item) in exam.items().iter().enumerate() {
        let kind = match item {
            ExamItem::MultipleChoice { .. } => "MCQ",
            ExamItem::FillBlank { .. } => "FIB",
            ExamItem::ShortAnswer { .. } => "SA",
        };
        let answer = answers.get(i).map(String::as_str).unwrap_or("");
        println!("  {:>3}. {:<4} {}", i + 1, kind.dimmed(), answer);
    }
    println!();
    println!("{}", grade);

    if grade.passed(args.pass) {
        crate::print_success(&format!("Passed ({}% >= {}%)", grade.overall, args.pass));
    } else {
        crate::print_error(&format!("Not passed ({}% < {}%)", grade.overall, args.pass));
    }

    Ok(())
}
