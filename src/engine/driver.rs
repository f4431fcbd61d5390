// src/engine/driver.rs

//! State shared by the sequential and the parallel driver.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::AbortReason;
use crate::engine::state::RunState;
use crate::errors::Result;
use crate::exec::{Settlement, TaskReport, settle};
use crate::locking::LockManager;
use crate::report::Reporter;

pub struct Driver<'a> {
    pub locks: &'a dyn LockManager,
    pub reporter: &'a mut dyn Reporter,
    pub cancel: &'a CancellationToken,
    abort: Option<AbortReason>,
}

impl<'a> Driver<'a> {
    pub fn new(
        locks: &'a dyn LockManager,
        reporter: &'a mut dyn Reporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            locks,
            reporter,
            cancel,
            abort: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Why the run stopped early, if it did.
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match &self.abort {
            Some(reason) => Some(reason.clone()),
            None if self.cancel.is_cancelled() => Some(AbortReason::Cancelled),
            None => None,
        }
    }

    /// Log a message through the reporter when `verbose` is set.
    pub fn verbose(&mut self, state: &RunState, message: &str) {
        if state.config.verbose {
            self.reporter.log(state, message);
        }
    }

    /// Apply a finished execution: settle the task, print its failure,
    /// leave the in-flight set, release its resources.
    ///
    /// The release is attempted even when settling failed. A release error
    /// is returned only after the failure line and fail-fast were handled.
    pub async fn complete(&mut self, state: &mut RunState, report: TaskReport) -> Result<Settlement> {
        let index = report.index;
        let settled = settle(&state.config, &mut state.tasks[index], report);
        state.retire(index);
        let released = self.locks.release(&state.tasks[index]).await;

        let settlement = settled?;

        if let Some(line) = &settlement.failure_line {
            self.reporter.log(state, line);
        }

        if settlement.abort_run && self.abort.is_none() {
            let task = state.tasks[index].name.clone();
            debug!(task = %task, "fail-fast: stopping admission of new tasks");
            self.abort = Some(AbortReason::FailFast { task });
            self.cancel.cancel();
        }

        released?;
        Ok(settlement)
    }
}
