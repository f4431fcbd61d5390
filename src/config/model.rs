// src/config/model.rs

use regex::Regex;
use serde::Deserialize;

/// Raw configuration as supplied by the embedder.
///
/// All fields are optional and have defaults, so a config can be
/// deserialized from a partial document:
///
/// ```toml
/// concurrency = 4
/// fail_fast = true
/// ignore_errors = "ECONNRESET"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawRunConfig {
    /// Maximum number of tasks in flight; `0` runs everything sequentially.
    pub concurrency: usize,

    /// Abort the run after the first task failure.
    pub fail_fast: bool,

    /// Regex; failures whose detail matches are not printed (they still
    /// count as errors).
    pub ignore_errors: Option<String>,

    /// Suppress the live status line and progress output.
    pub quiet: bool,

    /// Log admission decisions of the parallel driver.
    pub verbose: bool,

    /// Do not list expected-to-fail tasks in the summary.
    pub expect_nothing: bool,

    /// Never overwrite the status line in place, even on a terminal.
    pub no_clear_line: bool,

    /// Regex selecting test cases by name.
    pub filter: Option<String>,

    pub print_tasks: bool,
    pub list_conflicts: bool,
    pub clear_external_locks: bool,
    pub list_locks: bool,

    /// Comma-separated resource names to lock in the external lock service.
    pub manually_lock: Option<String>,
}

fn default_concurrency() -> usize {
    10
}

impl Default for RawRunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fail_fast: false,
            ignore_errors: None,
            quiet: false,
            verbose: false,
            expect_nothing: false,
            no_clear_line: false,
            filter: None,
            print_tasks: false,
            list_conflicts: false,
            clear_external_locks: false,
            list_locks: false,
            manually_lock: None,
        }
    }
}

/// A single administrative action that replaces normal scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    /// Lock these resources in the external lock service and stop.
    ManuallyLock(Vec<String>),
    PrintTasks,
    ListConflicts,
    ClearExternalLocks,
    ListLocks,
}

/// Validated, immutable configuration for one run.
///
/// Construct via `RunConfig::try_from(raw)`; see [`super::validate`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub concurrency: usize,
    pub fail_fast: bool,
    pub ignore_errors: Option<Regex>,
    pub quiet: bool,
    pub verbose: bool,
    pub expect_nothing: bool,
    pub no_clear_line: bool,
    pub filter: Option<Regex>,
    pub print_tasks: bool,
    pub list_conflicts: bool,
    pub clear_external_locks: bool,
    pub list_locks: bool,
    pub manually_lock: Option<Vec<String>>,
}

impl RunConfig {
    /// `true` when tasks run one at a time.
    pub fn is_sequential(&self) -> bool {
        self.concurrency == 0
    }

    /// Whether a failure detail should be printed, given `ignore_errors`.
    pub fn should_surface(&self, detail: &str) -> bool {
        match &self.ignore_errors {
            Some(re) => !re.is_match(detail),
            None => true,
        }
    }

    /// The administrative action requested by the config, if any.
    ///
    /// When several flags are set the first one in this order wins:
    /// manual lock, print tasks, list conflicts, clear external locks,
    /// list locks.
    pub fn admin_action(&self) -> Option<AdminAction> {
        if let Some(resources) = &self.manually_lock {
            return Some(AdminAction::ManuallyLock(resources.clone()));
        }
        if self.print_tasks {
            return Some(AdminAction::PrintTasks);
        }
        if self.list_conflicts {
            return Some(AdminAction::ListConflicts);
        }
        if self.clear_external_locks {
            return Some(AdminAction::ClearExternalLocks);
        }
        if self.list_locks {
            return Some(AdminAction::ListLocks);
        }
        None
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fail_fast: false,
            ignore_errors: None,
            quiet: false,
            verbose: false,
            expect_nothing: false,
            no_clear_line: false,
            filter: None,
            print_tasks: false,
            list_conflicts: false,
            clear_external_locks: false,
            list_locks: false,
            manually_lock: None,
        }
    }
}
