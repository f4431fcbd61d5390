// src/engine/sequential.rs

//! Sequential driver: one task at a time, in order.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::engine::driver::Driver;
use crate::engine::state::RunState;
use crate::errors::Result;
use crate::exec::{TaskRun, execute_isolated};
use crate::task::TaskStatus;

/// Run every non-skipped task in order, holding its resources for the whole
/// running window.
///
/// Stops early when the driver's cancellation token fires (fail-fast or an
/// outside cancel).
pub async fn sequential_run(driver: &mut Driver<'_>, state: &mut RunState) -> Result<()> {
    let quiet = state.config.quiet;

    let skipped: Vec<&str> = state
        .tasks
        .iter()
        .filter(|t| t.status() == TaskStatus::Skipped)
        .map(|t| t.name.as_str())
        .collect();
    if !quiet && !skipped.is_empty() {
        let message = format!("Skipped {} tests ({})", skipped.len(), skipped.join(" "));
        driver.reporter.log(state, &message);
    }

    for index in 0..state.tasks.len() {
        if state.tasks[index].status() == TaskStatus::Skipped {
            continue;
        }
        if driver.is_cancelled() {
            debug!(remaining_from = index, "sequential run cancelled");
            break;
        }

        let acquired = tokio::select! {
            res = driver.locks.acquire_blocking(&state.tasks[index]) => {
                res?;
                true
            }
            _ = driver.cancel.cancelled() => false,
        };
        if !acquired {
            break;
        }

        if !quiet {
            let message = format!("{} ...", state.tasks[index].name);
            driver.reporter.log(state, &message);
        }

        let now = Instant::now();
        state.admit(index, now)?;
        let run = TaskRun::new(&state.tasks[index], now);

        let report = execute_isolated(Arc::clone(&state.config), run).await;
        driver.complete(state, report).await?;
    }

    Ok(())
}
