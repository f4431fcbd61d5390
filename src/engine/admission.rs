// src/engine/admission.rs

//! Admission control: which `todo` task may start next.

use tracing::trace;

use crate::locking::LockManager;
use crate::task::{Task, TaskStatus};

/// Result of one scan over the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// This task's resources were locked; it must be started now.
    Admit(usize),
    /// Nothing could be admitted. `first_blocked` is the earliest `todo`
    /// task whose resources were busy.
    Exhausted { first_blocked: Option<usize> },
}

/// Scan `tasks` in order and lock the first `todo` task whose resources are
/// free.
///
/// Busy tasks are skipped so a later free task can still start; the first
/// busy one is remembered for the starvation fallback.
pub async fn select_next(locks: &dyn LockManager, tasks: &[Task]) -> anyhow::Result<Admission> {
    let mut first_blocked = None;

    for (index, task) in tasks.iter().enumerate() {
        if task.status() != TaskStatus::Todo {
            continue;
        }

        if locks.try_acquire(task).await? {
            return Ok(Admission::Admit(index));
        }

        trace!(task = %task.name, "resources busy; trying next task");
        first_blocked.get_or_insert(index);
    }

    Ok(Admission::Exhausted { first_blocked })
}
