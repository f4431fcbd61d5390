// src/engine/in_flight.rs

//! Set of spawned task executions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::{Id, JoinSet};

use crate::config::RunConfig;
use crate::errors::{Result, TestherdError};
use crate::exec::{TaskReport, TaskRun, execute, report_from_join_error};

/// Bookkeeping for one spawned execution.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub index: usize,
    /// Admission sequence number, used in verbose logging.
    pub seq: u64,
    pub started: Instant,
}

/// Executions currently in flight.
///
/// Completions are taken from a [`JoinSet`] in the order they finish; the
/// Tokio task id maps straight back to the slot.
#[derive(Default)]
pub struct InFlight {
    set: JoinSet<TaskReport>,
    slots: HashMap<Id, Slot>,
    next_seq: u64,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start executing `run` right away.
    pub fn spawn(&mut self, config: Arc<RunConfig>, run: TaskRun) -> Slot {
        let slot = Slot {
            index: run.index,
            seq: self.next_seq,
            started: run.started,
        };
        self.next_seq += 1;

        let handle = self.set.spawn(execute(config, run));
        self.slots.insert(handle.id(), slot);
        slot
    }

    /// Wait for whichever execution finishes first.
    ///
    /// Returns `Ok(None)` when nothing is in flight. A panicked execution is
    /// turned into a failed report.
    pub async fn next_finished(&mut self) -> Result<Option<(Slot, TaskReport)>> {
        let Some(joined) = self.set.join_next_with_id().await else {
            return Ok(None);
        };

        match joined {
            Ok((id, report)) => {
                let slot = self.take_slot(id)?;
                Ok(Some((slot, report)))
            }
            Err(err) => {
                let slot = self.take_slot(err.id())?;
                let report = report_from_join_error(slot.index, slot.started, err);
                Ok(Some((slot, report)))
            }
        }
    }

    fn take_slot(&mut self, id: Id) -> Result<Slot> {
        self.slots.remove(&id).ok_or_else(|| {
            TestherdError::Internal(format!("finished execution {id} is not tracked"))
        })
    }
}
