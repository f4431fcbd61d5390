// src/engine/mod.rs

//! Scheduling engine.
//!
//! - [`state`] holds the per-run [`RunState`] shared with the reporter.
//! - [`admission`] picks the next admissible task (order + resource locks).
//! - [`in_flight`] tracks spawned executions and yields whichever finishes
//!   first.
//! - [`driver`] holds what both drivers share: collaborators, cancellation,
//!   and the completion path.
//! - [`sequential`] and [`parallel`] are the two run loops.
//! - [`runner`] is the run entry: hooks, administrative actions, driver
//!   selection, shutdown.

pub mod admission;
pub mod driver;
pub mod in_flight;
pub mod parallel;
pub mod runner;
pub mod sequential;
pub mod state;

use crate::locking::{ExternalLock, ResourceConflict};
use crate::types::{CANCELLED_EXIT_CODE, FAIL_FAST_EXIT_CODE};

pub use admission::{Admission, select_next};
pub use runner::{RunReport, Runner};
pub use state::{RunPhase, RunState};

/// Why a run stopped before every task was considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// `fail_fast` is set and this task failed.
    FailFast { task: String },
    /// The run's cancellation token was cancelled from outside.
    Cancelled,
}

/// Result of an administrative action that replaced scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminReport {
    ManuallyLocked(Vec<String>),
    PrintedTasks(usize),
    Conflicts(Vec<ResourceConflict>),
    ClearedExternalLocks,
    ExternalLocks(Vec<ExternalLock>),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task reached a terminal state.
    Completed,
    FailFast { task: String },
    Cancelled,
    /// The run loop failed; `Runner::run` returns the error itself.
    Errored { message: String },
    Administrative(AdminReport),
}

impl RunOutcome {
    pub fn from_abort(abort: Option<AbortReason>) -> Self {
        match abort {
            None => RunOutcome::Completed,
            Some(AbortReason::FailFast { task }) => RunOutcome::FailFast { task },
            Some(AbortReason::Cancelled) => RunOutcome::Cancelled,
        }
    }

    /// Tasks may have been left in `todo`.
    pub fn is_aborted(&self) -> bool {
        matches!(
            self,
            RunOutcome::FailFast { .. } | RunOutcome::Cancelled | RunOutcome::Errored { .. }
        )
    }

    /// Process exit status implied by the outcome alone; see
    /// [`RunReport::exit_code`] for the one that also accounts for failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::FailFast { .. } => FAIL_FAST_EXIT_CODE,
            RunOutcome::Cancelled => CANCELLED_EXIT_CODE,
            RunOutcome::Errored { .. } => 1,
            RunOutcome::Completed | RunOutcome::Administrative(_) => 0,
        }
    }
}
