// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::task::TaskStatus;

#[derive(Error, Debug)]
pub enum TestherdError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to lock {resource}: Locked by {holder}, expires in {expires_in_ms}ms")]
    LockContention {
        resource: String,
        holder: String,
        expires_in_ms: u64,
    },

    #[error("no external lock service configured (needed for {0})")]
    ExternalLocksUnavailable(&'static str),

    #[error("task {task} cannot move from {from} to {to}")]
    InvalidTransition {
        task: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TestherdError>;
