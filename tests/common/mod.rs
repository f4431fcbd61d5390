#![allow(dead_code)]

use std::sync::Arc;

use testherd::config::{RawRunConfig, RunConfig};
use testherd::engine::{RunReport, Runner};
use testherd::task::{TaskStatus, TestCase};

pub use testherd_test_utils::{
    CaseBuilder, ConcurrencyProbe, ExternallyHeldLocks, FakeLockService, RecordingReporter,
    ReportEvent, SharedBuffer, init_tracing, with_timeout,
};

/// Validated config built from defaults plus `tweak`.
pub fn config_with(tweak: impl FnOnce(&mut RawRunConfig)) -> RunConfig {
    let mut raw = RawRunConfig::default();
    tweak(&mut raw);
    RunConfig::try_from(raw).expect("test config should be valid")
}

/// Runner wired to a recording reporter; returns the reporter handle too.
pub fn recorded_runner(config: RunConfig) -> (Runner, RecordingReporter) {
    let reporter = RecordingReporter::new();
    let runner = Runner::new(config).with_reporter(Box::new(reporter.clone()));
    (runner, reporter)
}

/// Run `cases` under `config`, recording everything.
pub async fn run_recorded(
    config: RunConfig,
    cases: Vec<Arc<dyn TestCase>>,
) -> (RunReport, RecordingReporter) {
    init_tracing();
    let (runner, reporter) = recorded_runner(config);
    let report = with_timeout(runner.run(cases))
        .await
        .expect("run should not error");
    (report, reporter)
}

/// `(name, status)` of every task, in order.
pub fn statuses(report: &RunReport) -> Vec<(String, TaskStatus)> {
    report
        .state
        .tasks
        .iter()
        .map(|t| (t.name.clone(), t.status()))
        .collect()
}
