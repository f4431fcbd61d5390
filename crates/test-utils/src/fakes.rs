#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use testherd::locking::{ExternalLock, ExternalLockService, LocalLockManager, LockAcquire, LockManager};
use testherd::task::Task;
use testherd::types::{BoxFuture, ResourceName};

/// In-memory stand-in for the distributed lock service.
#[derive(Default)]
pub struct FakeLockService {
    state: Mutex<FakeLockState>,
}

#[derive(Default)]
struct FakeLockState {
    held: Vec<ExternalLock>,
    cleared: usize,
    acquires: Vec<(Vec<ResourceName>, Duration)>,
}

impl FakeLockService {
    pub const CLIENT_ID: &'static str = "test-client";

    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another client holds `resource`.
    pub fn with_lock(self, resource: &str, client_id: &str, expires_in_ms: u64) -> Self {
        self.state.lock().unwrap().held.push(ExternalLock {
            resource: resource.to_string(),
            client_id: client_id.to_string(),
            expires_in_ms,
        });
        self
    }

    pub fn locks(&self) -> Vec<ExternalLock> {
        self.state.lock().unwrap().held.clone()
    }

    /// How often `clear_all_locks` was called.
    pub fn clear_count(&self) -> usize {
        self.state.lock().unwrap().cleared
    }

    /// Arguments of every `acquire` call.
    pub fn acquire_calls(&self) -> Vec<(Vec<ResourceName>, Duration)> {
        self.state.lock().unwrap().acquires.clone()
    }
}

impl ExternalLockService for FakeLockService {
    fn acquire<'a>(
        &'a self,
        resources: &'a [ResourceName],
        timeout: Duration,
    ) -> BoxFuture<'a, anyhow::Result<LockAcquire>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.acquires.push((resources.to_vec(), timeout));

            let taken = resources.iter().find_map(|r| {
                state
                    .held
                    .iter()
                    .find(|l| &l.resource == r && l.client_id != Self::CLIENT_ID)
            });
            if let Some(lock) = taken {
                return Ok(LockAcquire::Contended {
                    first_resource: lock.resource.clone(),
                    holder_client_id: lock.client_id.clone(),
                    expires_in_ms: lock.expires_in_ms,
                });
            }

            for resource in resources {
                state.held.push(ExternalLock {
                    resource: resource.clone(),
                    client_id: Self::CLIENT_ID.to_string(),
                    expires_in_ms: timeout.as_millis() as u64,
                });
            }
            Ok(LockAcquire::Acquired)
        })
    }

    fn clear_all_locks(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.held.clear();
            state.cleared += 1;
            Ok(())
        })
    }

    fn list_locks(&self) -> BoxFuture<'_, anyhow::Result<Vec<ExternalLock>>> {
        Box::pin(async move { Ok(self.locks()) })
    }
}

/// Lock manager whose resources may also be held "outside" the run, e.g. by
/// another runner process. Tasks needing an outside-held resource are not
/// admissible until [`release_outside`](Self::release_outside) is called.
#[derive(Default)]
pub struct ExternallyHeldLocks {
    inner: LocalLockManager,
    outside: Mutex<HashSet<ResourceName>>,
    released: Notify,
    blocking_acquires: AtomicUsize,
}

impl ExternallyHeldLocks {
    pub fn holding(resources: &[&str]) -> Self {
        let locks = Self::default();
        locks
            .outside
            .lock()
            .unwrap()
            .extend(resources.iter().map(|r| r.to_string()));
        locks
    }

    pub fn release_outside(&self, resource: &str) {
        self.outside.lock().unwrap().remove(resource);
        self.released.notify_waiters();
    }

    /// Number of `acquire_blocking` calls made by the scheduler.
    pub fn blocking_acquires(&self) -> usize {
        self.blocking_acquires.load(Ordering::SeqCst)
    }

    fn held_outside(&self, task: &Task) -> bool {
        let outside = self.outside.lock().unwrap();
        task.resources.iter().any(|r| outside.contains(r))
    }
}

impl LockManager for ExternallyHeldLocks {
    fn try_acquire<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<bool>> {
        Box::pin(async move {
            if self.held_outside(task) {
                return Ok(false);
            }
            self.inner.try_acquire(task).await
        })
    }

    fn acquire_blocking<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.blocking_acquires.fetch_add(1, Ordering::SeqCst);
            loop {
                let notified = self.released.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if !self.held_outside(task) {
                    break;
                }
                notified.await;
            }
            self.inner.acquire_blocking(task).await
        })
    }

    fn release<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, anyhow::Result<()>> {
        self.inner.release(task)
    }
}
