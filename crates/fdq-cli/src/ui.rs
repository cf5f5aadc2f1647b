//! Terminal UI helpers for the FDQ CLI

use colored::*;
use std::io::{self, Write};

use fdq_core::{Result, RunOutcome};
use fdq_fetch::SubmissionRow;

/// Display the startup banner
pub fn display_banner() {
    println!();
    println!("{}", "FDQ - FDA Drug Submission Q&A".blue().bold());
    println!(
        "{}",
        "Look up original FDA submissions, pick documents, ask a question.".dimmed()
    );
    println!(
        "{}",
        "Data from the openFDA drugs@FDA API; answers grounded in the selected PDFs.".dimmed()
    );
    println!();
}

/// Render the submission rows as a numbered table
pub fn render_submissions(rows: &[SubmissionRow]) {
    println!("{}", "Original submissions".bold());
    for (index, row) in rows.iter().enumerate() {
        println!(
            "{:>4}. {} ({})  {}  {}  {}",
            index + 1,
            row.brand_name.bold(),
            row.generic_name,
            row.application_number.cyan(),
            row.document_type.yellow(),
            row.url.dimmed()
        );
        println!(
            "      sponsor: {}  review priority: {}",
            row.sponsor_name, row.review_priority
        );
    }
    println!();
}

/// Prompt for one line of input
pub fn prompt(label: &str) -> Result<String> {
    print!("{} ", label.green().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Parse a comma-separated selection like `1,3,4` into 1-based row numbers.
///
/// Out-of-range and non-numeric entries are dropped; duplicates keep their
/// first position.
pub fn parse_selection(input: &str, row_count: usize) -> Vec<usize> {
    let mut selected = Vec::new();

    for token in input.split(',') {
        let Ok(index) = token.trim().parse::<usize>() else {
            continue;
        };
        if index >= 1 && index <= row_count && !selected.contains(&index) {
            selected.push(index);
        }
    }

    selected
}

/// Render the terminal outcome of a run
pub fn render_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Answered(answer) => {
            println!("{}", "Answer".bold());
            println!("{}", answer.text);

            if !answer.citations.is_empty() {
                println!();
                println!("{}", "Citations".bold());
                for citation in &answer.citations {
                    println!("  {citation}");
                }
            }
        }
        RunOutcome::Aborted(reason) => {
            println!("{} {}", "Run aborted:".yellow().bold(), reason);
        }
    }
}
