// src/engine/runner.rs

//! Run entry point: hooks, administrative actions, driver selection and
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{AdminAction, RunConfig};
use crate::engine::driver::Driver;
use crate::engine::parallel::parallel_run;
use crate::engine::sequential::sequential_run;
use crate::engine::state::{RunPhase, RunState};
use crate::engine::{AdminReport, RunOutcome};
use crate::errors::{Result, TestherdError};
use crate::hooks::{NoHooks, NoNotifier, Notifier, RunHooks};
use crate::locking::{ExternalLockService, LocalLockManager, LockManager};
use crate::report::{ConsoleReporter, Reporter};
use crate::task::{Task, TaskStatus, TestCase, tasks_from_cases};
use crate::types::MANUAL_LOCK_TIMEOUT_MS;

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub state: RunState,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Process exit status: the outcome's own status, or 1 when a completed
    /// run has failed tasks.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            RunOutcome::Completed if self.state.count(TaskStatus::Error) > 0 => 1,
            ref outcome => outcome.exit_code(),
        }
    }
}

/// Configured run, ready to execute a list of test cases.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use testherd::{RunConfig, Runner, TestCase};
/// # async fn demo(cases: Vec<Arc<dyn TestCase>>) -> testherd::errors::Result<()> {
/// let runner = Runner::new(RunConfig::default());
/// let report = runner.run(cases).await?;
/// std::process::exit(report.exit_code());
/// # }
/// ```
pub struct Runner {
    config: Arc<RunConfig>,
    locks: Arc<dyn LockManager>,
    external_locks: Option<Arc<dyn ExternalLockService>>,
    notifier: Arc<dyn Notifier>,
    hooks: Arc<dyn RunHooks>,
    reporter: Box<dyn Reporter>,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
            locks: Arc::new(LocalLockManager::new()),
            external_locks: None,
            notifier: Arc::new(NoNotifier),
            hooks: Arc::new(NoHooks),
            reporter: Box::new(ConsoleReporter::stderr()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_lock_manager(mut self, locks: Arc<dyn LockManager>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_external_locks(mut self, service: Arc<dyn ExternalLockService>) -> Self {
        self.external_locks = Some(service);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RunHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Token that stops the run when cancelled (e.g. from a Ctrl-C handler).
    ///
    /// Fail-fast cancels the same token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute `cases` and return the final state.
    ///
    /// Task failures never make this return `Err`; they are recorded in the
    /// report. Errors come from hooks, collaborators, administrative actions
    /// and internal inconsistencies. `after_all` runs in every case once
    /// `before_all` succeeded.
    pub async fn run(mut self, cases: Vec<Arc<dyn TestCase>>) -> Result<RunReport> {
        let start_time = Local::now();
        info!(
            cases = cases.len(),
            concurrency = self.config.concurrency,
            fail_fast = self.config.fail_fast,
            "starting test run"
        );

        self.hooks
            .before_all(&self.config)
            .await
            .map_err(|source| TestherdError::Hook {
                hook: "before_all",
                source,
            })?;

        let tasks = tasks_from_cases(&self.config, cases, self.locks.as_ref());
        let mut state = RunState::new(Arc::clone(&self.config), tasks);

        let result = self.run_tasks(&mut state).await;

        let after = self.hooks.after_all(&self.config).await;
        let outcome = result?;
        after.map_err(|source| TestherdError::Hook {
            hook: "after_all",
            source,
        })?;

        let end_time = Local::now();
        info!(
            ?outcome,
            passed = state.count(TaskStatus::Success),
            failed = state.count(TaskStatus::Error),
            skipped = state.count(TaskStatus::Skipped),
            elapsed_ms = (end_time - start_time).num_milliseconds(),
            "test run finished"
        );

        Ok(RunReport {
            start_time,
            end_time,
            state,
            outcome,
        })
    }

    async fn run_tasks(&mut self, state: &mut RunState) -> Result<RunOutcome> {
        if let Some(action) = self.config.admin_action() {
            debug!(?action, "administrative action replaces scheduling");
            let report = self.administer(state, action).await?;
            return Ok(RunOutcome::Administrative(report));
        }

        self.locks.init(state).await?;
        state.phase = RunPhase::Running;

        let (driven, abort) = {
            let mut driver = Driver::new(self.locks.as_ref(), &mut *self.reporter, &self.cancel);
            let driven = if self.config.is_sequential() {
                sequential_run(&mut driver, state).await
            } else {
                parallel_run(&mut driver, state).await
            };
            (driven, driver.abort_reason())
        };

        state.phase = RunPhase::Finished;
        let outcome = match (&driven, abort) {
            (Err(e), None) => RunOutcome::Errored {
                message: e.to_string(),
            },
            (_, abort) => RunOutcome::from_abort(abort),
        };
        self.reporter.finish(state, &outcome);
        if let Err(e) = &driven {
            warn!(error = %e, "run loop failed");
        }

        // Shutdown runs even after a failed loop; the loop error wins.
        let shutdown = self.locks.shutdown(&self.config, state).await;
        let notified = self.notifier.shutdown(&self.config).await;
        driven?;
        shutdown?;
        notified?;
        Ok(outcome)
    }

    async fn administer(&mut self, state: &RunState, action: AdminAction) -> Result<AdminReport> {
        match action {
            AdminAction::ManuallyLock(resources) => {
                let service = self.external_service("--manually-lock")?;
                let timeout = Duration::from_millis(MANUAL_LOCK_TIMEOUT_MS);
                info!(?resources, "locking resources in the external lock service");
                service.acquire(&resources, timeout).await?.into_result()?;
                self.reporter
                    .log(state, &format!("Locked {}", resources.join(", ")));
                Ok(AdminReport::ManuallyLocked(resources))
            }
            AdminAction::PrintTasks => {
                for task in &state.tasks {
                    self.reporter.log(state, &describe_task(task));
                }
                Ok(AdminReport::PrintedTasks(state.tasks.len()))
            }
            AdminAction::ListConflicts => {
                let conflicts = self.locks.list_conflicts(&self.config, &state.tasks);
                if conflicts.is_empty() {
                    self.reporter.log(state, "No resource conflicts.");
                }
                for conflict in &conflicts {
                    let line = format!("{}: {}", conflict.resource, conflict.tasks.join(" "));
                    self.reporter.log(state, &line);
                }
                Ok(AdminReport::Conflicts(conflicts))
            }
            AdminAction::ClearExternalLocks => {
                let service = self.external_service("--clear-external-locks")?;
                service.clear_all_locks().await?;
                info!("cleared all external locks");
                self.reporter.log(state, "Cleared all external locks.");
                Ok(AdminReport::ClearedExternalLocks)
            }
            AdminAction::ListLocks => {
                let service = self.external_service("--list-locks")?;
                let locks = service.list_locks().await?;
                if locks.is_empty() {
                    self.reporter.log(state, "No external locks held.");
                }
                for lock in &locks {
                    self.reporter.log(state, &lock.to_string());
                }
                Ok(AdminReport::ExternalLocks(locks))
            }
        }
    }

    fn external_service(&self, action: &'static str) -> Result<Arc<dyn ExternalLockService>> {
        self.external_locks
            .clone()
            .ok_or(TestherdError::ExternalLocksUnavailable(action))
    }
}

/// One line of `--print-tasks` output.
fn describe_task(task: &Task) -> String {
    let mut line = format!("#{} {} ({})", task.index, task.name, task.status());
    if task.id != task.name {
        line.push_str(&format!(" id={}", task.id));
    }
    if !task.resources.is_empty() {
        let resources: Vec<&str> = task.resources.iter().map(String::as_str).collect();
        line.push_str(&format!(" resources: {}", resources.join(",")));
    }
    if task.expected_to_fail {
        line.push_str(" [expected to fail]");
    }
    line
}
