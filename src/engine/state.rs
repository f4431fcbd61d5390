// src/engine/state.rs

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::task::{Task, TaskStatus};

/// Where the run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Tasks built, scheduling not started (administrative actions run here).
    Preparing,
    Running,
    Finished,
}

/// State of one run, passed explicitly to every reporter call.
#[derive(Debug)]
pub struct RunState {
    pub config: Arc<RunConfig>,
    /// All tasks, in original order. `tasks[i].index == i`.
    pub tasks: Vec<Task>,
    /// Indices of tasks currently in flight. Only the run loop writes it.
    pub running: BTreeSet<usize>,
    pub phase: RunPhase,
}

impl RunState {
    pub fn new(config: Arc<RunConfig>, tasks: Vec<Task>) -> Self {
        Self {
            config,
            tasks,
            running: BTreeSet::new(),
            phase: RunPhase::Preparing,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }

    /// First task that is not terminal, if any.
    pub fn first_unfinished(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| !t.status().is_terminal())
    }

    /// Mark a task `running` and add it to the in-flight set.
    pub(crate) fn admit(&mut self, index: usize, now: Instant) -> Result<()> {
        self.tasks[index].mark_running(now)?;
        self.running.insert(index);
        Ok(())
    }

    pub(crate) fn retire(&mut self, index: usize) {
        self.running.remove(&index);
    }
}
