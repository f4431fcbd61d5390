// src/locking/mod.rs

//! Locking gateway.
//!
//! The scheduler only talks to the [`LockManager`] trait:
//! - `annotate` attaches resource requirements to each task at construction,
//! - `try_acquire` / `acquire_blocking` / `release` bracket every running
//!   window,
//! - `init` / `shutdown` bracket the whole run.
//!
//! [`LocalLockManager`] is the in-process default. The distributed lock
//! service is abstracted by [`ExternalLockService`] and only used by the
//! administrative actions of the runner.

pub mod external;
pub mod local;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::RunConfig;
use crate::engine::RunState;
use crate::task::{Task, TestCase};
use crate::types::{BoxFuture, ResourceName};

pub use external::{ExternalLock, ExternalLockService, LockAcquire};
pub use local::LocalLockManager;

/// A resource that more than one task requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConflict {
    pub resource: ResourceName,
    /// Names of the competing tasks, in task order.
    pub tasks: Vec<String>,
}

/// Resource-lock manager consulted by the scheduler.
pub trait LockManager: Send + Sync {
    /// Resource requirements of a test case. Called once per task.
    fn annotate(&self, _config: &RunConfig, case: &dyn TestCase) -> BTreeSet<ResourceName> {
        case.resources().into_iter().collect()
    }

    fn init<'a>(&'a self, _state: &'a RunState) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Lock all resources of `task` if they are free right now.
    ///
    /// Returns `false` without holding anything if any resource is taken.
    fn try_acquire<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<bool>>;

    /// Wait until all resources of `task` can be locked, then hold them.
    fn acquire_blocking<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Release whatever is held for `task`. Releasing twice is a no-op.
    fn release<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>>;

    fn shutdown<'a>(
        &'a self,
        _config: &'a RunConfig,
        _state: &'a RunState,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Diagnostic listing of resources shared by several tasks.
    fn list_conflicts(&self, _config: &RunConfig, tasks: &[Task]) -> Vec<ResourceConflict> {
        shared_resources(tasks)
    }
}

/// Group tasks by resource and keep resources needed by two or more tasks.
pub fn shared_resources(tasks: &[Task]) -> Vec<ResourceConflict> {
    let mut by_resource: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for task in tasks {
        for resource in &task.resources {
            by_resource
                .entry(resource.as_str())
                .or_default()
                .push(task.name.clone());
        }
    }

    by_resource
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(resource, tasks)| ResourceConflict {
            resource: resource.to_string(),
            tasks,
        })
        .collect()
}
