// tests/config_settings.rs

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use el_listen::config::loader::{
    BUILTIN_DIR_ENV_VAR, SELF_PLUGIN_ENV_VAR, USER_DIR_ENV_VAR, WATCH_BACKEND_ENV_VAR,
};
use el_listen::config::{load_from_path, resolve_settings, ConfigFile};
use el_listen::errors::ListenError;
use el_listen::watch::BackendChoice;

type TestResult = Result<(), Box<dyn Error>>;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_come_from_home_and_executable_dir() -> TestResult {
    let settings = resolve_settings(
        ConfigFile::default(),
        env_of(&[]),
        Some(PathBuf::from("/home/u")),
        Some(PathBuf::from("/opt/el/bin")),
    )?;

    assert_eq!(settings.registry.user_dir, PathBuf::from("/home/u/.el/listen.d"));
    assert_eq!(settings.registry.builtin_dir, PathBuf::from("/opt/el/bin"));
    assert_eq!(
        settings.registry.discovered_root,
        PathBuf::from("/home/u/.claude/plugins/cache")
    );
    assert_eq!(settings.registry.self_plugin, "el");
    assert_eq!(settings.watch_backend, BackendChoice::Auto);

    Ok(())
}

#[test]
fn environment_overrides_file_which_overrides_defaults() -> TestResult {
    let file: ConfigFile = toml::from_str(
        r#"
        user_dir = "~/custom/listen.d"
        builtin_dir = "/from/file"
        self_plugin = "mine"
        watch_backend = "native"
        "#,
    )?;

    let settings = resolve_settings(
        file,
        env_of(&[
            (BUILTIN_DIR_ENV_VAR, "/from/env"),
            (WATCH_BACKEND_ENV_VAR, "poll"),
        ]),
        Some(PathBuf::from("/home/u")),
        Some(PathBuf::from("/opt/el/bin")),
    )?;

    assert_eq!(settings.registry.user_dir, PathBuf::from("/home/u/custom/listen.d"));
    assert_eq!(settings.registry.builtin_dir, PathBuf::from("/from/env"));
    assert_eq!(settings.registry.self_plugin, "mine");
    assert_eq!(settings.watch_backend, BackendChoice::Poll);

    Ok(())
}

#[test]
fn env_values_are_tilde_expanded_too() -> TestResult {
    let settings = resolve_settings(
        ConfigFile::default(),
        env_of(&[(USER_DIR_ENV_VAR, "~/x"), (SELF_PLUGIN_ENV_VAR, "other")]),
        Some(PathBuf::from("/home/u")),
        Some(PathBuf::from("/bin")),
    )?;
    assert_eq!(settings.registry.user_dir, PathBuf::from("/home/u/x"));
    assert_eq!(settings.registry.self_plugin, "other");
    Ok(())
}

#[test]
fn invalid_backend_in_env_is_a_config_error() {
    let res = resolve_settings(
        ConfigFile::default(),
        env_of(&[(WATCH_BACKEND_ENV_VAR, "inotify")]),
        Some(PathBuf::from("/home/u")),
        Some(PathBuf::from("/bin")),
    );
    assert!(matches!(res, Err(ListenError::Config(_))));
}

#[test]
fn missing_home_without_overrides_is_a_config_error() {
    let res = resolve_settings(
        ConfigFile::default(),
        env_of(&[]),
        None,
        Some(PathBuf::from("/bin")),
    );
    assert!(matches!(res, Err(ListenError::Config(_))));
}

#[test]
fn config_files_reject_unknown_keys() -> TestResult {
    let tmp = tempfile::tempdir()?;

    let good = tmp.path().join("good.toml");
    fs::write(&good, "plugin_cache = \"/cache\"\n")?;
    let parsed = load_from_path(&good)?;
    assert_eq!(parsed.plugin_cache, Some(PathBuf::from("/cache")));

    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "user_dirs = \"/typo\"\n")?;
    assert!(matches!(load_from_path(&bad), Err(ListenError::Config(_))));

    assert!(load_from_path(tmp.path().join("absent.toml")).is_err());
    Ok(())
}
