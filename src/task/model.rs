// src/task/model.rs

//! Task record and status state machine.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::errors::{Result, TestherdError};
use crate::task::case::TestCase;
use crate::types::ResourceName;

/// Status of a task.
///
/// ```text
/// todo -> running -> success
///                 -> error
/// todo -> skipped            (decided at construction)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Todo,
    Skipped,
    Running,
    Success,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Skipped | TaskStatus::Success | TaskStatus::Error)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Todo, TaskStatus::Running)
                | (TaskStatus::Todo, TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Success)
                | (TaskStatus::Running, TaskStatus::Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure captured from a task body.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    /// Top-level error message.
    pub message: String,
    /// Full error report (message plus cause chain); matched against
    /// `ignore_errors`.
    pub detail: String,
    /// When the failure was observed.
    pub at: DateTime<Local>,
    /// The body panicked instead of returning an error.
    pub panicked: bool,
}

impl TaskFailure {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            detail: format!("{err:?}"),
            at: Local::now(),
            panicked: false,
        }
    }

    pub fn from_panic(message: String) -> Self {
        Self {
            detail: format!("task panicked: {message}"),
            message,
            at: Local::now(),
            panicked: true,
        }
    }
}

/// One schedulable unit wrapping a single test case and its run-time state.
pub struct Task {
    /// Position in the original sequence; admission order follows it.
    pub index: usize,
    pub id: String,
    pub name: String,
    status: TaskStatus,
    pub start_time: Option<Instant>,
    pub duration: Option<Duration>,
    pub error: Option<TaskFailure>,
    pub expected_to_fail: bool,
    pub resources: BTreeSet<ResourceName>,
    case: Arc<dyn TestCase>,
}

impl Task {
    /// Create a task in `todo`, or `skipped` when `skip` is set.
    pub fn new(
        index: usize,
        case: Arc<dyn TestCase>,
        skip: bool,
        expected_to_fail: bool,
        resources: BTreeSet<ResourceName>,
    ) -> Self {
        Self {
            index,
            id: case.id().to_string(),
            name: case.name().to_string(),
            status: if skip { TaskStatus::Skipped } else { TaskStatus::Todo },
            start_time: None,
            duration: None,
            error: None,
            expected_to_fail,
            resources,
            case,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn case(&self) -> &Arc<dyn TestCase> {
        &self.case
    }

    /// Enter `running`, recording `start_time`.
    pub fn mark_running(&mut self, now: Instant) -> Result<()> {
        self.transition(TaskStatus::Running)?;
        self.start_time = Some(now);
        Ok(())
    }

    pub fn mark_success(&mut self, duration: Duration) -> Result<()> {
        self.transition(TaskStatus::Success)?;
        self.duration = Some(duration);
        Ok(())
    }

    pub fn mark_error(&mut self, duration: Duration, failure: TaskFailure) -> Result<()> {
        self.transition(TaskStatus::Error)?;
        self.duration = Some(duration);
        self.error = Some(failure);
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(TestherdError::InvalidTransition {
                task: self.name.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("duration", &self.duration)
            .field("error", &self.error.as_ref().map(|e| &e.message))
            .field("expected_to_fail", &self.expected_to_fail)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::types::BoxFuture;

    struct Noop;

    impl TestCase for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn run<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn todo_task() -> Task {
        Task::new(0, Arc::new(Noop), false, false, BTreeSet::new())
    }

    #[test]
    fn running_then_success_records_timing() {
        let mut task = todo_task();
        let start = Instant::now();
        task.mark_running(start).unwrap();
        assert_eq!(task.status(), TaskStatus::Running);
        assert_eq!(task.start_time, Some(start));

        task.mark_success(Duration::from_millis(5)).unwrap();
        assert_eq!(task.status(), TaskStatus::Success);
        assert_eq!(task.duration, Some(Duration::from_millis(5)));
        assert!(task.status().is_terminal());
    }

    #[test]
    fn terminal_tasks_cannot_be_reentered() {
        let mut task = todo_task();
        task.mark_running(Instant::now()).unwrap();
        task.mark_error(Duration::ZERO, TaskFailure::from_panic("boom".into()))
            .unwrap();

        let err = task.mark_running(Instant::now()).unwrap_err();
        assert!(matches!(
            err,
            TestherdError::InvalidTransition {
                from: TaskStatus::Error,
                to: TaskStatus::Running,
                ..
            }
        ));
    }

    #[test]
    fn todo_cannot_finish_without_running() {
        let mut task = todo_task();
        assert!(task.mark_success(Duration::ZERO).is_err());
        assert_eq!(task.status(), TaskStatus::Todo);
    }

    #[test]
    fn skipped_at_construction_is_terminal() {
        let mut task = Task::new(3, Arc::new(Noop), true, false, BTreeSet::new());
        assert_eq!(task.status(), TaskStatus::Skipped);
        assert!(task.mark_running(Instant::now()).is_err());
    }

    #[test]
    fn failure_detail_includes_cause_chain() {
        let err = anyhow::anyhow!("connection refused").context("login failed");
        let failure = TaskFailure::from_error(&err);
        assert_eq!(failure.message, "login failed");
        assert!(failure.detail.contains("connection refused"));
        assert!(!failure.panicked);
    }
}
