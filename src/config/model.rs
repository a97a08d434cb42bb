// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::registry::RegistryConfig;
use crate::watch::BackendChoice;

/// Optional on-disk configuration, read from TOML.
///
/// ```toml
/// user_dir = "~/.el/listen.d"
/// builtin_dir = "/opt/el/bin"
/// plugin_cache = "~/.claude/plugins/cache"
/// self_plugin = "el"
/// watch_backend = "auto"
/// ```
///
/// Every field is optional. Environment variables override the file, and
/// the file overrides the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub user_dir: Option<PathBuf>,

    #[serde(default)]
    pub builtin_dir: Option<PathBuf>,

    /// Root of the third-party plugin cache scanned for `listen.d` dirs.
    #[serde(default)]
    pub plugin_cache: Option<PathBuf>,

    /// Plugin whose own sources are skipped during discovery.
    #[serde(default)]
    pub self_plugin: Option<String>,

    #[serde(default)]
    pub watch_backend: Option<BackendChoice>,
}

/// Fully resolved settings handed to the rest of the crate.
#[derive(Debug, Clone)]
pub struct Settings {
    pub registry: RegistryConfig,
    pub watch_backend: BackendChoice,
}
