//! Report rendering
//!
//! Prints a pipeline report either for humans or as JSON.

use anyhow::Result;
use colored::*;
use stackrun_core::domain::outcome::{FinalState, OperationOutcome, PipelineReport};

/// Print a report to stdout
pub fn print_report(report: &PipelineReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Pipeline {} ({}, {} operation(s)):",
            report.run_id,
            report.mode,
            report.outcomes.len()
        )
        .bold()
    );
    println!();

    for outcome in &report.outcomes {
        print_outcome(outcome);
    }

    let duration = report
        .finished_at
        .signed_duration_since(report.started_at)
        .num_seconds();
    let summary = format!(
        "{} completed, {} failed, {} skipped in {}s",
        report.count(FinalState::Completed),
        report.count(FinalState::Failed),
        report.count(FinalState::Skipped),
        duration
    );
    if report.is_failed() {
        println!("{} {}", "✗".red().bold(), summary.red());
    } else {
        println!("{} {}", "✓".green().bold(), summary.green());
    }

    Ok(())
}

/// Print a single operation outcome
fn print_outcome(outcome: &OperationOutcome) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        outcome.stack_name.bold(),
        format!("({}/{})", outcome.account, outcome.region).dimmed()
    );
    println!("    Action: {}", outcome.action);
    println!("    Status: {}", colorize_state(outcome));
    if let Some(token) = &outcome.token {
        println!("    Token:  {}", token.to_string().dimmed());
    }
    for reason in &outcome.reasons {
        println!("    {} {}: {}", "✗".red(), reason.resource_id.cyan(), reason.reason);
    }
    println!();
}

/// Colorize the outcome status for display
fn colorize_state(outcome: &OperationOutcome) -> ColoredString {
    let label = outcome.status_label();
    match outcome.state {
        FinalState::Completed => label.green(),
        FinalState::Failed => label.red(),
        FinalState::Skipped => label.yellow(),
    }
}
