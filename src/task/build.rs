// src/task/build.rs

use std::sync::Arc;

use tracing::debug;

use crate::config::RunConfig;
use crate::locking::LockManager;
use crate::task::case::TestCase;
use crate::task::model::Task;

/// Turn test cases into tasks, one per case, in input order.
///
/// Cases whose name does not match `config.filter` are dropped. The skip
/// predicate is evaluated here, once, and the lock manager annotates each
/// task with its resource requirements.
pub fn tasks_from_cases(
    config: &RunConfig,
    cases: Vec<Arc<dyn TestCase>>,
    locks: &dyn LockManager,
) -> Vec<Task> {
    cases
        .into_iter()
        .filter(|case| match &config.filter {
            Some(re) => re.is_match(case.name()),
            None => true,
        })
        .enumerate()
        .map(|(index, case)| {
            let skip = case.skip(config);
            let expected_to_fail = case.expected_to_fail(config);
            let resources = locks.annotate(config, case.as_ref());
            debug!(
                task = %case.name(),
                index,
                skip,
                ?resources,
                "built task from test case"
            );
            Task::new(index, case, skip, expected_to_fail, resources)
        })
        .collect()
}
