// src/types.rs

//! Small shared types used across modules.

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future returned by the collaborator traits
/// (`TestCase`, `LockManager`, `ExternalLockService`, hooks).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Canonical resource name type.
pub type ResourceName = String;

/// Exit status used when a run is aborted by fail-fast.
pub const FAIL_FAST_EXIT_CODE: i32 = 3;

/// Exit status used when a run is cancelled from outside (e.g. Ctrl-C).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// How long a manual pre-lock waits for the external lock service.
pub const MANUAL_LOCK_TIMEOUT_MS: u64 = 60_000;
