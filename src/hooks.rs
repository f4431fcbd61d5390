// src/hooks.rs

//! Embedder callbacks around a run.

use crate::config::RunConfig;
use crate::types::BoxFuture;

/// Suite-level setup and teardown.
///
/// `after_all` runs even when the run itself failed.
pub trait RunHooks: Send + Sync {
    fn before_all<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn after_all<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Told once when every task has completed (not on administrative runs).
pub trait Notifier: Send + Sync {
    fn shutdown<'a>(&'a self, config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RunHooks for NoHooks {}

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn shutdown<'a>(&'a self, _config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
