// src/config/mod.rs

//! Run configuration.
//!
//! - [`model`] holds the serde-backed raw config and the validated
//!   [`RunConfig`] the scheduler consumes.
//! - [`validate`] turns a [`RawRunConfig`] into a [`RunConfig`]
//!   (regex compilation, lock list splitting).
//!
//! Where the raw values come from (CLI, a file, code) is up to the embedder;
//! see [`crate::cli`] for the clap front-end.

pub mod model;
pub mod validate;

pub use model::{AdminAction, RawRunConfig, RunConfig};
