// src/task/case.rs

use crate::config::RunConfig;
use crate::types::{BoxFuture, ResourceName};

/// A single test case, as constructed by the embedder.
///
/// Only `name` and `run` are required. The remaining methods are consulted
/// once, when the case is turned into a [`Task`](super::Task).
pub trait TestCase: Send + Sync {
    fn name(&self) -> &str;

    /// Stable identifier; defaults to the name.
    fn id(&self) -> &str {
        self.name()
    }

    /// The test body. An `Err` (or a panic) marks the task as failed.
    fn run<'a>(&'a self, config: &'a RunConfig) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Whether this case should be skipped under `config`.
    fn skip(&self, _config: &RunConfig) -> bool {
        false
    }

    /// Known-failing case; still counted as an error when it fails, but
    /// listed separately in the summary.
    fn expected_to_fail(&self, _config: &RunConfig) -> bool {
        false
    }

    /// Resources this case needs exclusive access to. Read by the lock
    /// manager's `annotate` step.
    fn resources(&self) -> Vec<ResourceName> {
        Vec::new()
    }
}
