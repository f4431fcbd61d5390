// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `testherd` is a library; a test binary that embeds it can either parse
//! [`CliArgs`] directly or `#[command(flatten)]` [`RunArgs`] into its own
//! parser.

use clap::{Args, Parser, ValueEnum};

use crate::config::{RawRunConfig, RunConfig};
use crate::errors::Result;

/// Command-line arguments for a `testherd`-driven test binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testherd",
    version,
    about = "Run test cases in parallel with resource locking and live progress.",
    long_about = None
)]
pub struct CliArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTHERD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Flags controlling a single run.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Maximum number of tests running at once (0 = sequential).
    #[arg(short = 'C', long, value_name = "N", default_value_t = 10)]
    pub concurrency: usize,

    /// Abort the whole run after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Do not print failures whose details match this regex.
    #[arg(short = 'I', long, value_name = "REGEX")]
    pub ignore_errors: Option<String>,

    /// No status line or progress output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log scheduler decisions.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not report tests declared as expected to fail.
    #[arg(short = 'E', long)]
    pub expect_nothing: bool,

    /// Print every status update on its own line.
    #[arg(long)]
    pub no_clear_line: bool,

    /// Only run tests whose name matches this regex.
    #[arg(short, long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Print the task list and exit.
    #[arg(long)]
    pub print_tasks: bool,

    /// Print tasks that compete for the same resources and exit.
    #[arg(long)]
    pub list_conflicts: bool,

    /// Remove all locks from the external lock service and exit.
    #[arg(long)]
    pub clear_external_locks: bool,

    /// List locks held in the external lock service and exit.
    #[arg(long)]
    pub list_locks: bool,

    /// Lock the given comma-separated resources externally and exit.
    #[arg(long, value_name = "RESOURCES")]
    pub manually_lock: Option<String>,
}

impl RunArgs {
    pub fn to_raw(&self) -> RawRunConfig {
        RawRunConfig {
            concurrency: self.concurrency,
            fail_fast: self.fail_fast,
            ignore_errors: self.ignore_errors.clone(),
            quiet: self.quiet,
            verbose: self.verbose,
            expect_nothing: self.expect_nothing,
            no_clear_line: self.no_clear_line,
            filter: self.filter.clone(),
            print_tasks: self.print_tasks,
            list_conflicts: self.list_conflicts,
            clear_external_locks: self.clear_external_locks,
            list_locks: self.list_locks,
            manually_lock: self.manually_lock.clone(),
        }
    }

    /// Validate the flags into a [`RunConfig`].
    pub fn into_config(self) -> Result<RunConfig> {
        RunConfig::try_from(self.to_raw())
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
