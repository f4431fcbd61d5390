// src/engine/parallel.rs

//! Bounded-concurrency driver.
//!
//! Each round has a fill phase and a drain phase:
//!
//! 1. fill: admit tasks in order while fewer than `concurrency` are in
//!    flight and a scan finds one whose resources are free;
//! 2. drain: wait for the first in-flight execution to finish, settle it and
//!    release its resources.
//!
//! When nothing is in flight and nothing could be admitted, every remaining
//! task is blocked on resources held elsewhere. The loop then waits on the
//! earliest blocked task's resources. With nothing blocked either, the run
//! is over and every task must be terminal.
//!
//! If the loop fails (a lock manager error, an inconsistent state), nothing
//! new is admitted: executions in flight are awaited and settled, and the
//! resources of any task still marked running are released before the
//! error is returned.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::engine::admission::{Admission, select_next};
use crate::engine::driver::Driver;
use crate::engine::in_flight::InFlight;
use crate::engine::state::RunState;
use crate::errors::{Result, TestherdError};
use crate::exec::TaskRun;

pub async fn parallel_run(driver: &mut Driver<'_>, state: &mut RunState) -> Result<()> {
    let mut in_flight = InFlight::new();

    driver.reporter.status(state);

    let result = fill_and_drain(driver, state, &mut in_flight).await;
    if result.is_err() {
        debug!(in_flight = in_flight.len(), "run loop failed; winding down");
        wind_down(driver, state, &mut in_flight).await;
    }
    result
}

async fn fill_and_drain(
    driver: &mut Driver<'_>,
    state: &mut RunState,
    in_flight: &mut InFlight,
) -> Result<()> {
    let concurrency = state.config.concurrency.max(1);

    loop {
        let mut first_blocked = None;

        while in_flight.len() < concurrency && !driver.is_cancelled() {
            match select_next(driver.locks, &state.tasks).await? {
                Admission::Admit(index) => admit(driver, state, in_flight, index)?,
                Admission::Exhausted { first_blocked: blocked } => {
                    first_blocked = blocked;
                    break;
                }
            }
        }

        if in_flight.is_empty() {
            if driver.is_cancelled() {
                debug!("run cancelled and nothing in flight; stopping");
                return Ok(());
            }

            let Some(index) = first_blocked else {
                return ensure_all_terminal(state);
            };

            debug!(
                task = %state.tasks[index].name,
                "every remaining task is blocked; waiting for the first one"
            );
            let acquired = tokio::select! {
                res = driver.locks.acquire_blocking(&state.tasks[index]) => {
                    res?;
                    true
                }
                _ = driver.cancel.cancelled() => false,
            };
            if acquired {
                admit(driver, state, in_flight, index)?;
            }
            continue;
        }

        let Some((slot, report)) = in_flight.next_finished().await? else {
            continue;
        };

        let settlement = driver.complete(state, report).await?;
        let task = &state.tasks[slot.index];
        debug!(
            task = %task.name,
            seq = slot.seq,
            status = %task.status(),
            failed = settlement.failure_line.is_some(),
            "execution finished"
        );
        let message = format!(
            "[runner] finished task #{}: {} ({})",
            slot.seq,
            task.id,
            task.status()
        );
        driver.verbose(state, &message);
        driver.reporter.status(state);
    }
}

/// Settle whatever is still in flight and release the resources of tasks
/// left running. Errors here are logged; the loop error takes precedence.
async fn wind_down(driver: &mut Driver<'_>, state: &mut RunState, in_flight: &mut InFlight) {
    loop {
        match in_flight.next_finished().await {
            Ok(Some((_slot, report))) => {
                if let Err(e) = driver.complete(state, report).await {
                    warn!(error = %e, "failed to settle task while winding down");
                }
                driver.reporter.status(state);
            }
            Ok(None) => break,
            Err(e) => warn!(error = %e, "lost track of a finished execution"),
        }
    }

    let stranded: Vec<usize> = state.running.iter().copied().collect();
    for index in stranded {
        if let Err(e) = driver.locks.release(&state.tasks[index]).await {
            warn!(task = %state.tasks[index].name, error = %e, "failed to release resources");
        }
        state.retire(index);
    }
}

/// Mark `index` running and spawn its execution.
fn admit(
    driver: &mut Driver<'_>,
    state: &mut RunState,
    in_flight: &mut InFlight,
    index: usize,
) -> Result<()> {
    let now = Instant::now();
    state.admit(index, now)?;

    let run = TaskRun::new(&state.tasks[index], now);
    let slot = in_flight.spawn(Arc::clone(&state.config), run);

    let task = &state.tasks[index];
    debug!(task = %task.name, seq = slot.seq, in_flight = in_flight.len(), "admitted task");
    let message = format!("[runner] started task #{}: {}", slot.seq, task.id);
    driver.verbose(state, &message);
    driver.reporter.status(state);
    Ok(())
}

fn ensure_all_terminal(state: &RunState) -> Result<()> {
    match state.first_unfinished() {
        None => Ok(()),
        Some(task) => Err(TestherdError::Internal(format!(
            "Would end testing now, but task {} is still in status {}",
            task.name,
            task.status()
        ))),
    }
}
