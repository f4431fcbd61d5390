// src/report/mod.rs

//! Progress and summary reporting.
//!
//! - [`status_line`] renders the single live status line, fitted to the
//!   terminal width.
//! - [`summary`] renders the final summary and the consistency self-check.
//! - [`console`] is the default [`Reporter`], writing to stderr/stdout.
//!
//! Reporters get the run state on every call and keep no run state of
//! their own.

pub mod console;
pub mod status_line;
pub mod summary;

use crate::engine::{RunOutcome, RunState};

pub use console::{ConsoleReporter, TerminalWidth};
pub use status_line::render_status_line;
pub use summary::{consistency_diagnostic, summary_lines};

/// Sink for everything the scheduler wants the user to see.
pub trait Reporter: Send {
    /// The run state changed (task admitted or finished).
    fn status(&mut self, state: &RunState);

    /// An arbitrary message emitted during the run, e.g. a failure.
    fn log(&mut self, state: &RunState, message: &str);

    /// The run is over.
    fn finish(&mut self, state: &RunState, outcome: &RunOutcome);
}
