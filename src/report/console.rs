// src/report/console.rs

//! Default terminal reporter.

use std::io::{self, IsTerminal, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use tracing::{error, warn};

use crate::config::RunConfig;
use crate::engine::{RunOutcome, RunState};
use crate::report::Reporter;
use crate::report::status_line::render_status_line;
use crate::report::summary::{consistency_diagnostic, summary_lines};

/// Where the status line width comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalWidth {
    /// Ask the terminal; unbounded when the output is not a terminal.
    Detect,
    Fixed(usize),
    Unbounded,
}

/// Writes the live status line and the summary to one stream (stderr by
/// default) and log messages to another (stdout by default).
///
/// On a terminal the status line is redrawn in place; otherwise every
/// update is printed on its own line.
pub struct ConsoleReporter {
    status_out: Box<dyn Write + Send>,
    log_out: Box<dyn Write + Send>,
    interactive: bool,
    width: TerminalWidth,
}

impl ConsoleReporter {
    /// Status on stderr, messages on stdout.
    pub fn stderr() -> Self {
        Self {
            status_out: Box::new(io::stderr()),
            log_out: Box::new(io::stdout()),
            interactive: io::stderr().is_terminal(),
            width: TerminalWidth::Detect,
        }
    }

    pub fn with_writers(
        status_out: Box<dyn Write + Send>,
        log_out: Box<dyn Write + Send>,
        interactive: bool,
        width: TerminalWidth,
    ) -> Self {
        Self {
            status_out,
            log_out,
            interactive,
            width,
        }
    }

    fn terminal_width(&self) -> Option<usize> {
        match self.width {
            TerminalWidth::Detect if self.interactive => {
                terminal::size().ok().map(|(cols, _rows)| usize::from(cols))
            }
            TerminalWidth::Detect | TerminalWidth::Unbounded => None,
            TerminalWidth::Fixed(width) => Some(width),
        }
    }

    /// Whether status updates overwrite the previous one.
    fn overwrites(&self, config: &RunConfig) -> bool {
        self.interactive && !config.no_clear_line
    }

    fn clean(&mut self, config: &RunConfig) -> io::Result<()> {
        if !self.overwrites(config) {
            return Ok(());
        }
        queue!(self.status_out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        self.status_out.flush()
    }

    fn draw_status(&mut self, state: &RunState) -> io::Result<()> {
        let line = render_status_line(&state.tasks, self.terminal_width());
        self.clean(&state.config)?;
        self.status_out.write_all(line.as_bytes())?;
        if !self.overwrites(&state.config) {
            self.status_out.write_all(b"\n")?;
        }
        self.status_out.flush()
    }

    fn write_log(&mut self, state: &RunState, message: &str) -> io::Result<()> {
        let redraw = state.is_in_progress() && !state.config.is_sequential();
        if redraw {
            self.clean(&state.config)?;
        }
        writeln!(self.log_out, "{message}")?;
        self.log_out.flush()?;
        if redraw && !state.config.quiet {
            self.draw_status(state)?;
        }
        Ok(())
    }

    fn write_summary(&mut self, state: &RunState, outcome: &RunOutcome) -> io::Result<()> {
        self.clean(&state.config)?;
        for line in summary_lines(&state.config, &state.tasks, outcome) {
            writeln!(self.status_out, "{line}")?;
        }
        self.status_out.flush()
    }
}

impl Reporter for ConsoleReporter {
    fn status(&mut self, state: &RunState) {
        if state.config.quiet {
            return;
        }
        if let Err(e) = self.draw_status(state) {
            warn!(error = %e, "failed to draw status line");
        }
    }

    fn log(&mut self, state: &RunState, message: &str) {
        if let Err(e) = self.write_log(state, message) {
            warn!(error = %e, "failed to write log message");
        }
    }

    fn finish(&mut self, state: &RunState, outcome: &RunOutcome) {
        if let Some(diagnostic) = consistency_diagnostic(&state.tasks, outcome.is_aborted()) {
            error!(%diagnostic, "run finished in an inconsistent state");
        }
        if let Err(e) = self.write_summary(state, outcome) {
            warn!(error = %e, "failed to write summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::RawRunConfig;
    use crate::engine::RunPhase;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn reporter(interactive: bool) -> (ConsoleReporter, Buffer, Buffer) {
        let status = Buffer::default();
        let log = Buffer::default();
        let reporter = ConsoleReporter::with_writers(
            Box::new(status.clone()),
            Box::new(log.clone()),
            interactive,
            TerminalWidth::Fixed(80),
        );
        (reporter, status, log)
    }

    fn state(raw: RawRunConfig, phase: RunPhase) -> RunState {
        let mut state = RunState::new(Arc::new(RunConfig::try_from(raw).unwrap()), Vec::new());
        state.phase = phase;
        state
    }

    #[test]
    fn non_interactive_status_is_newline_terminated() {
        let (mut rep, status, _log) = reporter(false);
        let st = state(RawRunConfig::default(), RunPhase::Running);
        rep.status(&st);
        rep.status(&st);
        assert_eq!(
            status.text(),
            "0/0 done, 0 failed, 0 running ()\n0/0 done, 0 failed, 0 running ()\n"
        );
    }

    #[test]
    fn interactive_status_overwrites_in_place() {
        let (mut rep, status, _log) = reporter(true);
        let st = state(RawRunConfig::default(), RunPhase::Running);
        rep.status(&st);
        let text = status.text();
        assert!(text.starts_with('\u{1b}'), "expected a clear sequence: {text:?}");
        assert!(text.ends_with("0 running ()"));
    }

    #[test]
    fn quiet_suppresses_status() {
        let (mut rep, status, _log) = reporter(false);
        let st = state(
            RawRunConfig {
                quiet: true,
                ..RawRunConfig::default()
            },
            RunPhase::Running,
        );
        rep.status(&st);
        assert_eq!(status.text(), "");
    }

    #[test]
    fn log_during_parallel_run_redraws_status() {
        let (mut rep, status, log) = reporter(false);
        let st = state(RawRunConfig::default(), RunPhase::Running);
        rep.log(&st, "hello");
        assert_eq!(log.text(), "hello\n");
        assert_eq!(status.text(), "0/0 done, 0 failed, 0 running ()\n");
    }

    #[test]
    fn log_outside_a_run_is_plain() {
        let (mut rep, status, log) = reporter(true);
        let st = state(RawRunConfig::default(), RunPhase::Preparing);
        rep.log(&st, "hello");
        assert_eq!(log.text(), "hello\n");
        assert_eq!(status.text(), "");
    }

    #[test]
    fn finish_writes_summary() {
        let (mut rep, status, _log) = reporter(false);
        let st = state(RawRunConfig::default(), RunPhase::Finished);
        rep.finish(&st, &RunOutcome::Completed);
        assert_eq!(status.text(), "0 tests passed, 0 tests failed.\n");
    }
}
