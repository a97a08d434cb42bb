// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::{ConfigFile, Settings};
use crate::errors::{ListenError, Result};
use crate::registry::RegistryConfig;
use crate::watch::BackendChoice;

pub const CONFIG_ENV_VAR: &str = "EL_LISTEN_CONFIG";
pub const USER_DIR_ENV_VAR: &str = "EL_LISTEN_USER_DIR";
pub const BUILTIN_DIR_ENV_VAR: &str = "EL_LISTEN_BUILTIN_DIR";
pub const PLUGIN_CACHE_ENV_VAR: &str = "EL_LISTEN_PLUGIN_CACHE";
pub const SELF_PLUGIN_ENV_VAR: &str = "EL_LISTEN_SELF_PLUGIN";
pub const WATCH_BACKEND_ENV_VAR: &str = "EL_LISTEN_WATCH_BACKEND";

const DEFAULT_SELF_PLUGIN: &str = "el";

/// Load a configuration file from a given path.
///
/// Only performs TOML deserialization.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    toml::from_str(&contents)
        .map_err(|e| ListenError::Config(format!("parsing {:?}: {e}", path)))
}

/// Load settings for the running process: config file (if any), then
/// environment overrides, then defaults.
pub fn load_settings() -> Result<Settings> {
    let home = dirs::home_dir();
    let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

    let file = match config_path(&env, home.as_deref()) {
        Some(path) if path.is_file() => {
            debug!(?path, "loading config file");
            load_from_path(&path)?
        }
        Some(path) if env(CONFIG_ENV_VAR).is_some() => {
            return Err(ListenError::Config(format!(
                "{CONFIG_ENV_VAR} points at {:?}, which is not a file",
                path
            )));
        }
        _ => ConfigFile::default(),
    };

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));

    resolve_settings(file, env, home, exe_dir)
}

/// Merge a parsed config file with environment overrides and defaults.
///
/// `env` is a lookup function so callers (and tests) never have to mutate
/// the real process environment.
pub fn resolve_settings<F>(
    file: ConfigFile,
    env: F,
    home: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let home_ref = home.as_deref();

    let pick = |var: &str, from_file: Option<PathBuf>, default: Option<PathBuf>| {
        env(var)
            .map(PathBuf::from)
            .or(from_file)
            .map(|p| expand_tilde(&p, home_ref))
            .or(default)
    };

    let user_dir = pick(
        USER_DIR_ENV_VAR,
        file.user_dir,
        home.as_ref().map(|h| h.join(".el").join("listen.d")),
    )
    .ok_or_else(|| no_default("user_dir", USER_DIR_ENV_VAR))?;

    let builtin_dir = pick(BUILTIN_DIR_ENV_VAR, file.builtin_dir, exe_dir)
        .ok_or_else(|| no_default("builtin_dir", BUILTIN_DIR_ENV_VAR))?;

    let discovered_root = pick(
        PLUGIN_CACHE_ENV_VAR,
        file.plugin_cache,
        home.as_ref()
            .map(|h| h.join(".claude").join("plugins").join("cache")),
    )
    .ok_or_else(|| no_default("plugin_cache", PLUGIN_CACHE_ENV_VAR))?;

    let self_plugin = env(SELF_PLUGIN_ENV_VAR)
        .or(file.self_plugin)
        .unwrap_or_else(|| DEFAULT_SELF_PLUGIN.to_string());

    let watch_backend = match env(WATCH_BACKEND_ENV_VAR) {
        Some(raw) => raw.parse::<BackendChoice>().map_err(ListenError::Config)?,
        None => file.watch_backend.unwrap_or_default(),
    };

    Ok(Settings {
        registry: RegistryConfig {
            user_dir,
            builtin_dir,
            discovered_root,
            self_plugin,
        },
        watch_backend,
    })
}

fn config_path<F>(env: &F, home: Option<&Path>) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    env(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .or_else(|| home.map(|h| h.join(".el").join("listen.toml")))
}

/// Expand a leading `~` against the home directory, if known.
fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn no_default(field: &str, var: &str) -> ListenError {
    ListenError::Config(format!(
        "cannot determine {field}: no home directory; set {var}"
    ))
}
