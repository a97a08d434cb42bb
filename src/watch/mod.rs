// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling glob patterns into anchored regexes (`patterns`).
//! - Picking an available OS watch mechanism (`backend`) and running it
//!   until exactly one qualifying path changes (`fswatch`, `native`,
//!   `poll`).

pub mod backend;
pub mod fswatch;
pub mod native;
pub mod path_utils;
pub mod patterns;
pub mod poll;

use std::path::PathBuf;

pub use backend::{select_backend, BackendChoice, BackendKind, WatchBackend};
pub use patterns::{is_glob, CompiledGlob, WatchSpec, WatchTarget};

use crate::errors::Result;

/// Select a backend for `spec` and block until one target changes.
pub async fn wait_for_change(choice: BackendChoice, spec: &WatchSpec) -> Result<PathBuf> {
    let backend = select_backend(choice, spec)?;
    backend.wait_for_change(spec).await
}
