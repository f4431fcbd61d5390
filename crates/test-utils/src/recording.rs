#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use testherd::engine::{RunOutcome, RunState};
use testherd::report::{Reporter, render_status_line, summary_lines};

/// Everything a [`RecordingReporter`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// Rendered status line (unbounded width).
    Status(String),
    Log(String),
    Finish {
        outcome: RunOutcome,
        summary: Vec<String>,
    },
}

/// Reporter that records events instead of printing them.
///
/// Clones share the same event list, so keep one handle and give the other
/// to the runner.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
    max_running: Arc<Mutex<usize>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Status(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Summary lines of the last `finish` call.
    pub fn summary(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                ReportEvent::Finish { summary, .. } => Some(summary),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Largest in-flight set seen in any status update.
    pub fn max_running(&self) -> usize {
        *self.max_running.lock().unwrap()
    }

    fn push(&self, event: ReportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn status(&mut self, state: &RunState) {
        {
            let mut max = self.max_running.lock().unwrap();
            *max = (*max).max(state.running.len());
        }
        self.push(ReportEvent::Status(render_status_line(&state.tasks, None)));
    }

    fn log(&mut self, _state: &RunState, message: &str) {
        self.push(ReportEvent::Log(message.to_string()));
    }

    fn finish(&mut self, state: &RunState, outcome: &RunOutcome) {
        self.push(ReportEvent::Finish {
            outcome: outcome.clone(),
            summary: summary_lines(&state.config, &state.tasks, outcome),
        });
    }
}

/// Cloneable in-memory writer for feeding a `ConsoleReporter`.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
