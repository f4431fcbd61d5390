// src/locking/local.rs

//! In-process exclusive resource locks.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::locking::LockManager;
use crate::task::Task;
use crate::types::{BoxFuture, ResourceName};

/// Default [`LockManager`]: every resource may be held by one task at a time.
///
/// Blocking acquires park on a [`Notify`] that is woken on every release.
#[derive(Debug, Default)]
pub struct LocalLockManager {
    /// resource -> index of the holding task.
    held: Mutex<HashMap<ResourceName, usize>>,
    released: Notify,
}

impl LocalLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the task currently holding `resource`.
    pub fn holder_of(&self, resource: &str) -> Option<usize> {
        self.table().get(resource).copied()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<ResourceName, usize>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self, task: &Task) -> bool {
        let mut held = self.table();

        let blocked = task
            .resources
            .iter()
            .find(|r| held.get(*r).is_some_and(|owner| *owner != task.index));
        if let Some(resource) = blocked {
            trace!(task = %task.name, resource = %resource, "resource busy");
            return false;
        }

        for resource in &task.resources {
            held.insert(resource.clone(), task.index);
        }
        true
    }

    fn unlock(&self, task: &Task) {
        let mut held = self.table();
        held.retain(|_, owner| *owner != task.index);
    }
}

impl LockManager for LocalLockManager {
    fn try_acquire<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<bool>> {
        Box::pin(async move { Ok(self.try_lock(task)) })
    }

    fn acquire_blocking<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            loop {
                // Register interest before checking so a release between the
                // check and the await is not lost.
                let notified = self.released.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.try_lock(task) {
                    return Ok(());
                }

                debug!(task = %task.name, "waiting for resources to be released");
                notified.await;
            }
        })
    }

    fn release<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.unlock(task);
            self.released.notify_waiters();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::RunConfig;
    use crate::task::TestCase;

    struct Named(&'static str);

    impl TestCase for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn run<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn task(index: usize, name: &'static str, resources: &[&str]) -> Task {
        let resources: BTreeSet<String> = resources.iter().map(|r| r.to_string()).collect();
        Task::new(index, Arc::new(Named(name)), false, false, resources)
    }

    #[tokio::test]
    async fn shared_resource_is_exclusive() {
        let locks = LocalLockManager::new();
        let a = task(0, "a", &["X"]);
        let b = task(1, "b", &["X", "Y"]);

        assert!(locks.try_acquire(&a).await.unwrap());
        assert!(!locks.try_acquire(&b).await.unwrap());
        // A failed attempt must not leave partial locks behind.
        assert_eq!(locks.holder_of("Y"), None);

        locks.release(&a).await.unwrap();
        assert!(locks.try_acquire(&b).await.unwrap());
        assert_eq!(locks.holder_of("Y"), Some(1));
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let locks = LocalLockManager::new();
        let a = task(0, "a", &["X"]);
        assert!(locks.try_acquire(&a).await.unwrap());
        locks.release(&a).await.unwrap();
        locks.release(&a).await.unwrap();
        assert_eq!(locks.holder_of("X"), None);
    }

    #[tokio::test]
    async fn tasks_without_resources_never_block() {
        let locks = LocalLockManager::new();
        let a = task(0, "a", &[]);
        let b = task(1, "b", &[]);
        assert!(locks.try_acquire(&a).await.unwrap());
        assert!(locks.try_acquire(&b).await.unwrap());
    }

    #[tokio::test]
    async fn blocking_acquire_wakes_on_release() {
        let locks = Arc::new(LocalLockManager::new());
        let a = Arc::new(task(0, "a", &["X"]));
        let b = Arc::new(task(1, "b", &["X"]));
        assert!(locks.try_acquire(&a).await.unwrap());

        let waiter = {
            let locks = Arc::clone(&locks);
            let b = Arc::clone(&b);
            tokio::spawn(async move { locks.acquire_blocking(&b).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        locks.release(&a).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("blocking acquire did not wake up")
            .unwrap()
            .unwrap();
        assert_eq!(locks.holder_of("X"), Some(1));
    }
}
