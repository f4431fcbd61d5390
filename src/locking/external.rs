// src/locking/external.rs

//! Client interface of the distributed lock service.

use std::fmt;
use std::time::Duration;

use crate::errors::{Result, TestherdError};
use crate::types::{BoxFuture, ResourceName};

/// Result of an external acquire attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAcquire {
    Acquired,
    /// The first resource that could not be locked, and who holds it.
    Contended {
        first_resource: ResourceName,
        holder_client_id: String,
        expires_in_ms: u64,
    },
}

impl LockAcquire {
    /// Map contention onto [`TestherdError::LockContention`].
    pub fn into_result(self) -> Result<()> {
        match self {
            LockAcquire::Acquired => Ok(()),
            LockAcquire::Contended {
                first_resource,
                holder_client_id,
                expires_in_ms,
            } => Err(TestherdError::LockContention {
                resource: first_resource,
                holder: holder_client_id,
                expires_in_ms,
            }),
        }
    }
}

/// A lock currently held in the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLock {
    pub resource: ResourceName,
    pub client_id: String,
    pub expires_in_ms: u64,
}

impl fmt::Display for ExternalLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: locked by {}, expires in {}ms",
            self.resource, self.client_id, self.expires_in_ms
        )
    }
}

/// Distributed lock service shared between several runner processes.
pub trait ExternalLockService: Send + Sync {
    /// Try to lock all `resources`, waiting at most `timeout`.
    fn acquire<'a>(
        &'a self,
        resources: &'a [ResourceName],
        timeout: Duration,
    ) -> BoxFuture<'a, anyhow::Result<LockAcquire>>;

    fn clear_all_locks(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    fn list_locks(&self) -> BoxFuture<'_, anyhow::Result<Vec<ExternalLock>>>;
}
