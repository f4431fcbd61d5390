// src/exec/executor.rs

//! Per-task execution wrapper and failure classification.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::SecondsFormat;
use tokio::task::JoinError;
use tracing::debug;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::task::{Task, TaskFailure, TestCase};

/// Everything needed to run one admitted task, detached from the run state.
#[derive(Clone)]
pub struct TaskRun {
    pub index: usize,
    pub case: Arc<dyn TestCase>,
    pub started: Instant,
}

impl TaskRun {
    pub fn new(task: &Task, started: Instant) -> Self {
        Self {
            index: task.index,
            case: Arc::clone(task.case()),
            started,
        }
    }
}

/// Outcome of a task body.
#[derive(Debug)]
pub struct TaskReport {
    pub index: usize,
    pub elapsed: Duration,
    pub result: std::result::Result<(), TaskFailure>,
}

/// What the scheduler has to do after a report was applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Failure line to print right away (`None` on success or when the
    /// failure matches `ignore_errors`).
    pub failure_line: Option<String>,
    /// Fail-fast: the run must stop admitting tasks.
    pub abort_run: bool,
}

/// Run the task body. Errors are captured into the report; panics are not,
/// see [`execute_isolated`].
pub async fn execute(config: Arc<RunConfig>, run: TaskRun) -> TaskReport {
    let result = run
        .case
        .run(&config)
        .await
        .map_err(|err| TaskFailure::from_error(&err));

    TaskReport {
        index: run.index,
        elapsed: run.started.elapsed(),
        result,
    }
}

/// Run the task body on its own Tokio task so that a panic is reported as a
/// failure instead of unwinding into the scheduler.
pub async fn execute_isolated(config: Arc<RunConfig>, run: TaskRun) -> TaskReport {
    let index = run.index;
    let started = run.started;

    match tokio::spawn(execute(config, run)).await {
        Ok(report) => report,
        Err(err) => report_from_join_error(index, started, err),
    }
}

/// Build a failed report for a task whose Tokio task did not return.
pub fn report_from_join_error(index: usize, started: Instant, err: JoinError) -> TaskReport {
    let message = if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "task execution was aborted".to_string()
    };

    TaskReport {
        index,
        elapsed: started.elapsed(),
        result: Err(TaskFailure::from_panic(message)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Apply a report to its task: `running -> success | error`.
///
/// The failure is always stored on the task; `ignore_errors` only decides
/// whether a line is returned for printing.
pub fn settle(config: &RunConfig, task: &mut Task, report: TaskReport) -> Result<Settlement> {
    match report.result {
        Ok(()) => {
            task.mark_success(report.elapsed)?;
            debug!(
                task = %task.name,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "task succeeded"
            );
            Ok(Settlement::default())
        }
        Err(failure) => {
            // Failures reach the console only through the reporter; logging
            // them above debug would bypass `ignore_errors`.
            let surfaced = config.should_surface(&failure.detail);
            debug!(
                task = %task.name,
                elapsed_ms = report.elapsed.as_millis() as u64,
                panicked = failure.panicked,
                surfaced,
                error = %failure.message,
                "task failed"
            );

            let failure_line = surfaced.then(|| failure_line(&task.name, &failure));
            task.mark_error(report.elapsed, failure)?;

            Ok(Settlement {
                failure_line,
                abort_run: config.fail_fast,
            })
        }
    }
}

fn failure_line(name: &str, failure: &TaskFailure) -> String {
    format!(
        "test case {name} FAILED at {}:\n{}\n",
        failure.at.to_rfc3339_opts(SecondsFormat::Millis, false),
        failure.detail
    )
}
