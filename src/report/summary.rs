// src/report/summary.rs

//! Final summary and the consistency self-check.

use crate::config::RunConfig;
use crate::engine::RunOutcome;
use crate::task::{Task, TaskStatus};

/// Lines of the final summary, in print order.
pub fn summary_lines(config: &RunConfig, tasks: &[Task], outcome: &RunOutcome) -> Vec<String> {
    let mut lines = Vec::new();

    let success = tasks.iter().filter(|t| t.status() == TaskStatus::Success).count();
    let errors = tasks.iter().filter(|t| t.status() == TaskStatus::Error).count();
    let skipped = names_where(tasks, |t| t.status() == TaskStatus::Skipped);
    let expected_to_fail = names_where(tasks, |t| t.expected_to_fail);

    if tasks.is_empty() {
        if let Some(filter) = &config.filter {
            lines.push(format!("No test case found with filter: {}", filter.as_str()));
        }
    }

    lines.push(format!("{success} tests passed, {errors} tests failed."));

    if !skipped.is_empty() {
        lines.push(format!(
            "Skipped {} tests ({})",
            skipped.len(),
            skipped.join(" ")
        ));
    }

    if !config.expect_nothing && !expected_to_fail.is_empty() {
        lines.push(format!(
            "{} tests failed as expected ({}). Pass in -E/--expect-nothing to ignore expectedToFail declarations.",
            expected_to_fail.len(),
            expected_to_fail.join(" ")
        ));
    }

    let not_started = tasks.iter().filter(|t| t.status() == TaskStatus::Todo).count();
    match outcome {
        RunOutcome::FailFast { task } => lines.push(format!(
            "Aborted after {task} failed (fail-fast); {not_started} tests not started."
        )),
        RunOutcome::Cancelled => {
            lines.push(format!("Run cancelled; {not_started} tests not started."))
        }
        RunOutcome::Errored { message } => lines.push(format!(
            "Run stopped by an error ({message}); {not_started} tests not started."
        )),
        RunOutcome::Completed | RunOutcome::Administrative(_) => {}
    }

    if let Some(diagnostic) = consistency_diagnostic(tasks, outcome.is_aborted()) {
        lines.push(diagnostic);
    }

    lines
}

fn names_where(tasks: &[Task], pred: impl Fn(&Task) -> bool) -> Vec<&str> {
    tasks
        .iter()
        .filter(|&t| pred(t))
        .map(|t| t.name.as_str())
        .collect()
}

/// Self-check: every task should be skipped, successful or failed.
///
/// When the run was aborted, tasks that never left `todo` are accepted as
/// "not started". Returns an `INTERNAL ERROR` line naming the first
/// offending task otherwise.
pub fn consistency_diagnostic(tasks: &[Task], aborted: bool) -> Option<String> {
    let is_normal =
        |t: &Task| t.status().is_terminal() || (aborted && t.status() == TaskStatus::Todo);

    let inconsistent: Vec<&Task> = tasks.iter().filter(|t| !is_normal(t)).collect();
    let first = inconsistent.first()?;

    Some(format!(
        "INTERNAL ERROR: {} out of {} tasks are in an inconsistent state. First affected task is {} in state {}.",
        inconsistent.len(),
        tasks.len(),
        first.name,
        first.status()
    ))
}
