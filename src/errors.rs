// src/errors.rs

//! Crate-wide error type and exit-code mapping.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenError {
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("unknown source: {name}")]
    UnknownSource { name: String, known: Vec<String> },

    #[error("no watch backend can handle this request: {reason}\n  hint: {hint}")]
    BackendUnavailable { reason: String, hint: String },

    #[error("required tool not found on PATH: {0}")]
    ToolMissing(String),

    /// A monitored command failed. The diff engine recovers from this
    /// locally by treating the output as empty; it is never fatal.
    #[error("command failed: {command}: {reason}")]
    CommandFailure { command: String, reason: String },

    #[error("registry conflict: {0}")]
    RegistryConflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("watched file disappeared: {0:?}")]
    WatchedFileRemoved(PathBuf),

    #[error("interrupted by signal {0}")]
    Interrupted(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ListenError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ListenError::Interrupted(signo) => 128 + signo,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ListenError>;
