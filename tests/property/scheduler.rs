use std::sync::Arc;

use proptest::prelude::*;
use testherd::config::{RawRunConfig, RunConfig};
use testherd::engine::{RunOutcome, Runner};
use testherd::task::{TaskStatus, TestCase};
use testherd_test_utils::{CaseBuilder, ConcurrencyProbe, RecordingReporter};

/// Shape of one generated test case.
#[derive(Debug, Clone)]
struct CaseSpec {
    fails: bool,
    skip: bool,
    delay_ms: u64,
    resources: Vec<u8>,
}

fn case_strategy() -> impl Strategy<Value = CaseSpec> {
    (
        any::<bool>(),
        proptest::bool::weighted(0.15),
        0..4u64,
        proptest::collection::vec(0..3u8, 0..3),
    )
        .prop_map(|(fails, skip, delay_ms, resources)| CaseSpec {
            fails,
            skip,
            delay_ms,
            resources,
        })
}

fn build_cases(specs: &[CaseSpec], probe: &ConcurrencyProbe) -> Vec<Arc<dyn TestCase>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut builder = CaseBuilder::new(&format!("case_{i}"))
                .delay_ms(spec.delay_ms)
                .probe(probe);
            for r in &spec.resources {
                builder = builder.resource(&format!("r{r}"));
            }
            if spec.fails {
                builder = builder.fail("generated failure");
            }
            if spec.skip {
                builder = builder.skip();
            }
            builder.build()
        })
        .collect()
}

fn run_once(
    specs: &[CaseSpec],
    concurrency: usize,
) -> (Vec<TaskStatus>, RunOutcome, usize, RecordingReporter) {
    let probe = ConcurrencyProbe::new();
    let reporter = RecordingReporter::new();
    let raw = RawRunConfig {
        concurrency,
        quiet: true,
        ..RawRunConfig::default()
    };
    let config = RunConfig::try_from(raw).unwrap();
    let runner = Runner::new(config).with_reporter(Box::new(reporter.clone()));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let report = rt.block_on(runner.run(build_cases(specs, &probe))).unwrap();

    let statuses = report.state.tasks.iter().map(|t| t.status()).collect();
    (statuses, report.outcome, probe.max(), reporter)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sequential_and_parallel_agree_on_statuses(
        specs in proptest::collection::vec(case_strategy(), 0..8),
        concurrency in 1..5usize,
    ) {
        let (sequential, seq_outcome, seq_max, _) = run_once(&specs, 0);
        let (parallel, par_outcome, _, _) = run_once(&specs, concurrency);

        prop_assert_eq!(seq_outcome, RunOutcome::Completed);
        prop_assert_eq!(par_outcome, RunOutcome::Completed);
        prop_assert!(seq_max <= 1);
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn every_task_ends_terminal_within_the_concurrency_bound(
        specs in proptest::collection::vec(case_strategy(), 0..10),
        concurrency in 1..4usize,
    ) {
        let (statuses, _, max, reporter) = run_once(&specs, concurrency);

        prop_assert!(statuses.iter().all(|s| s.is_terminal()));
        prop_assert!(max <= concurrency);
        prop_assert!(reporter.max_running() <= concurrency);
        prop_assert!(!reporter.summary().iter().any(|l| l.starts_with("INTERNAL ERROR")));

        for (spec, status) in specs.iter().zip(&statuses) {
            let expected = match (spec.skip, spec.fails) {
                (true, _) => TaskStatus::Skipped,
                (false, true) => TaskStatus::Error,
                (false, false) => TaskStatus::Success,
            };
            prop_assert_eq!(*status, expected);
        }
    }
}
