// src/report/status_line.rs

use crate::task::{Task, TaskStatus};

/// Render `D/T done, F failed, R running (names)`.
///
/// `T` excludes skipped tasks. When `width` is given, the list of running
/// names is shortened until the line is narrower than `width`: as many names
/// as fit are shown and the rest collapse into a `+K` marker. If not even
/// the bare marker fits, the zero-name form is returned anyway.
pub fn render_status_line(tasks: &[Task], width: Option<usize>) -> String {
    let running: Vec<&str> = tasks
        .iter()
        .filter(|t| t.status() == TaskStatus::Running)
        .map(|t| t.name.as_str())
        .collect();

    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status() == status).count();
    let failed = count(TaskStatus::Error);
    let done = count(TaskStatus::Success) + failed;
    let total = tasks.len() - count(TaskStatus::Skipped);

    let prefix = format!(
        "{done}/{total} done, {failed} failed, {} running",
        running.len()
    );

    let mut shown = running.len();
    loop {
        let line = format!("{prefix} ({})", running_list(&running, shown));
        let fits = width.is_none_or(|w| line.chars().count() < w);
        if fits || shown == 0 {
            return line;
        }
        shown -= 1;
    }
}

/// First `shown` names, then `  +K` (two spaces) for the hidden rest.
fn running_list(names: &[&str], shown: usize) -> String {
    let hidden = names.len() - shown;
    let mut list = names[..shown].join(" ");
    if hidden > 0 {
        list.push_str(&format!("  +{hidden}"));
    }
    list
}
