// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod hooks;
pub mod locking;
pub mod logging;
pub mod report;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::CliArgs;

pub use crate::config::{RawRunConfig, RunConfig};
pub use crate::engine::{RunOutcome, RunReport, Runner};
pub use crate::errors::TestherdError;
pub use crate::hooks::{Notifier, RunHooks};
pub use crate::locking::{ExternalLockService, LocalLockManager, LockManager};
pub use crate::report::{ConsoleReporter, Reporter};
pub use crate::task::{Task, TaskStatus, TestCase};

/// High-level entry point for a test binary.
///
/// This wires together:
/// - flag validation
/// - the runner with its default collaborators
/// - Ctrl-C handling (cancels the run)
///
/// Returns the process exit status. Logging is left to the caller, see
/// [`logging::init_logging`].
pub async fn run(args: CliArgs, cases: Vec<Arc<dyn TestCase>>) -> Result<i32> {
    let config = args.run.into_config()?;
    let runner = Runner::new(config);

    // Ctrl-C → cancel the run; in-flight tasks are still awaited.
    {
        let cancel = runner.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            cancel.cancel();
        });
    }

    let report = runner.run(cases).await?;
    Ok(report.exit_code())
}
