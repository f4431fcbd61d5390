// src/task/mod.rs

//! Task model.
//!
//! - [`case`] defines the [`TestCase`] trait implemented by the embedder.
//! - [`model`] holds the [`Task`] record and its status state machine.
//! - [`build`] converts the input test cases into tasks, once per run.

pub mod build;
pub mod case;
pub mod model;

pub use build::tasks_from_cases;
pub use case::TestCase;
pub use model::{Task, TaskFailure, TaskStatus};
