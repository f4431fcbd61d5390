// tests/parallel_scheduling.rs

mod common;
use crate::common::{
    CaseBuilder, ConcurrencyProbe, ExternallyHeldLocks, config_with, init_tracing,
    recorded_runner, run_recorded, statuses, with_timeout,
};

use std::sync::Arc;
use std::time::Duration;

use testherd::engine::RunOutcome;
use testherd::task::TaskStatus;

#[tokio::test]
async fn three_tasks_with_concurrency_two_all_pass() {
    let probe = ConcurrencyProbe::new();
    let cases = ["a", "b", "c"]
        .iter()
        .map(|n| CaseBuilder::new(n).delay_ms(20).probe(&probe).build())
        .collect();

    let (report, reporter) = run_recorded(config_with(|c| c.concurrency = 2), cases).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.exit_code(), 0);
    assert!(
        statuses(&report)
            .iter()
            .all(|(_, s)| *s == TaskStatus::Success)
    );
    assert_eq!(
        reporter.statuses().last().map(String::as_str),
        Some("3/3 done, 0 failed, 0 running ()")
    );
    assert_eq!(probe.max(), 2);
    assert!(reporter.max_running() <= 2);
    assert_eq!(
        reporter.summary().first().map(String::as_str),
        Some("3 tests passed, 0 tests failed.")
    );
}

#[tokio::test]
async fn tasks_sharing_a_resource_never_overlap() {
    let probe = ConcurrencyProbe::new();
    let cases = vec![
        CaseBuilder::new("first").resource("X").delay_ms(30).probe(&probe).build(),
        CaseBuilder::new("second").resource("X").delay_ms(30).probe(&probe).build(),
    ];

    let (report, _reporter) = run_recorded(config_with(|c| c.concurrency = 5), cases).await;

    assert_eq!(probe.max(), 1);
    assert_eq!(probe.started(), vec!["first", "second"]);
    assert_eq!(report.state.count(TaskStatus::Success), 2);
}

#[tokio::test]
async fn in_flight_never_exceeds_concurrency() {
    let probe = ConcurrencyProbe::new();
    let cases = (0..8)
        .map(|i| {
            CaseBuilder::new(&format!("t{i}"))
                .delay_ms(10)
                .probe(&probe)
                .build()
        })
        .collect();

    let (report, reporter) = run_recorded(config_with(|c| c.concurrency = 3), cases).await;

    assert_eq!(report.state.count(TaskStatus::Success), 8);
    assert!(probe.max() <= 3, "max overlap was {}", probe.max());
    assert!(reporter.max_running() <= 3);
}

#[tokio::test]
async fn blocked_task_is_passed_over_in_favour_of_later_ones() {
    let cases = vec![
        CaseBuilder::new("a").resource("X").delay_ms(50).build(),
        CaseBuilder::new("b").resource("X").build(),
        CaseBuilder::new("c").build(),
    ];

    let config = config_with(|c| {
        c.concurrency = 5;
        c.verbose = true;
    });
    let (report, reporter) = run_recorded(config, cases).await;

    let started: Vec<String> = reporter
        .logs()
        .into_iter()
        .filter(|l| l.starts_with("[runner] started task"))
        .collect();
    assert_eq!(
        started,
        vec![
            "[runner] started task #0: a",
            "[runner] started task #1: c",
            "[runner] started task #2: b",
        ]
    );
    assert!(
        reporter
            .logs()
            .iter()
            .any(|l| l == "[runner] finished task #0: a (success)")
    );
    assert_eq!(report.state.count(TaskStatus::Success), 3);
}

#[tokio::test]
async fn starving_run_waits_for_the_first_blocked_task() {
    init_tracing();
    let locks = Arc::new(ExternallyHeldLocks::holding(&["X"]));
    let cases = vec![
        CaseBuilder::new("a").resource("X").build(),
        CaseBuilder::new("b").resource("X").build(),
    ];

    let (runner, _reporter) = recorded_runner(config_with(|c| c.concurrency = 4));
    let runner = runner.with_lock_manager(Arc::clone(&locks) as _);

    let releaser = {
        let locks = Arc::clone(&locks);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            locks.release_outside("X");
        })
    };

    let report = with_timeout(runner.run(cases)).await.unwrap();
    releaser.await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.state.count(TaskStatus::Success), 2);
    assert!(locks.blocking_acquires() >= 1);
}

#[tokio::test]
async fn skipped_tasks_are_excluded_from_the_total() {
    let cases = vec![
        CaseBuilder::new("run-me").build(),
        CaseBuilder::new("skip-me").skip().build(),
    ];

    let (report, reporter) = run_recorded(config_with(|_| {}), cases).await;

    assert_eq!(
        statuses(&report),
        vec![
            ("run-me".to_string(), TaskStatus::Success),
            ("skip-me".to_string(), TaskStatus::Skipped),
        ]
    );
    assert_eq!(
        reporter.statuses().last().map(String::as_str),
        Some("1/1 done, 0 failed, 0 running ()")
    );
    assert!(
        reporter
            .summary()
            .contains(&"Skipped 1 tests (skip-me)".to_string())
    );
}

#[tokio::test]
async fn filter_selects_cases_by_name() {
    let probe = ConcurrencyProbe::new();
    let cases = ["db_read", "db_write", "http_get"]
        .iter()
        .map(|n| CaseBuilder::new(n).probe(&probe).build())
        .collect();

    let (report, _reporter) =
        run_recorded(config_with(|c| c.filter = Some("^db_".to_string())), cases).await;

    assert_eq!(report.state.tasks.len(), 2);
    let mut started = probe.started();
    started.sort();
    assert_eq!(started, vec!["db_read", "db_write"]);
}
