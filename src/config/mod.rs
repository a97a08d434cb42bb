// src/config/mod.rs

//! Configuration loading.
//!
//! Responsibilities:
//! - Define the optional TOML-backed file model (`model.rs`).
//! - Merge file, environment and defaults into explicit `Settings`
//!   (`loader.rs`), so nothing downstream reads ambient state.

pub mod loader;
pub mod model;

pub use loader::{load_from_path, load_settings, resolve_settings};
pub use model::{ConfigFile, Settings};
