// src/config/validate.rs

use regex::Regex;

use crate::config::model::{RawRunConfig, RunConfig};
use crate::errors::{Result, TestherdError};

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = TestherdError;

    fn try_from(raw: RawRunConfig) -> std::result::Result<Self, Self::Error> {
        let ignore_errors = compile_pattern("ignore_errors", raw.ignore_errors.as_deref())?;
        let filter = compile_pattern("filter", raw.filter.as_deref())?;
        let manually_lock = raw
            .manually_lock
            .as_deref()
            .map(split_resource_list)
            .transpose()?;

        Ok(RunConfig {
            concurrency: raw.concurrency,
            fail_fast: raw.fail_fast,
            ignore_errors,
            quiet: raw.quiet,
            verbose: raw.verbose,
            expect_nothing: raw.expect_nothing,
            no_clear_line: raw.no_clear_line,
            filter,
            print_tasks: raw.print_tasks,
            list_conflicts: raw.list_conflicts,
            clear_external_locks: raw.clear_external_locks,
            list_locks: raw.list_locks,
            manually_lock,
        })
    }
}

fn compile_pattern(field: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    Regex::new(pattern).map(Some).map_err(|e| {
        TestherdError::Config(format!("`{field}` is not a valid regex ({pattern:?}): {e}"))
    })
}

fn split_resource_list(list: &str) -> Result<Vec<String>> {
    let resources: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();

    if resources.iter().any(|r| r.is_empty()) {
        return Err(TestherdError::Config(format!(
            "`manually_lock` contains an empty resource name: {list:?}"
        )));
    }

    Ok(resources)
}
