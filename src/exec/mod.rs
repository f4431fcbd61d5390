// src/exec/mod.rs

//! Task execution layer.
//!
//! [`executor`] runs a single task body, measures how long it took and turns
//! the result (including panics) into a [`TaskReport`]. `settle` then applies
//! the report to the task record and decides what has to be surfaced.

pub mod executor;

pub use executor::{
    Settlement, TaskReport, TaskRun, execute, execute_isolated, report_from_join_error, settle,
};
