use std::fs;
use std::path::{Path, PathBuf};

use el_listen::registry::RegistryConfig;
use tempfile::TempDir;

/// Write an executable `/bin/sh` script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("create script dir");
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    set_mode(&path, 0o755);
    path
}

/// Write a plain, non-executable file.
pub fn write_plain(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("create dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write file");
    set_mode(&path, 0o644);
    path
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

/// Temporary user, built-in and plugin-cache directories.
pub struct RegistryFixture {
    tmp: TempDir,
    pub config: RegistryConfig,
}

impl RegistryFixture {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = RegistryConfig {
            user_dir: tmp.path().join("user"),
            builtin_dir: tmp.path().join("builtin"),
            discovered_root: tmp.path().join("cache"),
            self_plugin: "el".to_string(),
        };
        fs::create_dir_all(&config.builtin_dir).expect("builtin dir");
        fs::create_dir_all(&config.discovered_root).expect("cache dir");
        Self { tmp, config }
    }

    /// Scratch directory for scripts that get registered as user sources.
    pub fn scratch(&self) -> PathBuf {
        self.tmp.path().join("scratch")
    }

    pub fn builtin(&self, name: &str, body: &str) -> PathBuf {
        write_script(&self.config.builtin_dir, name, body)
    }

    /// `<cache>/<marketplace>/<plugin>/1.0.0/listen.d/<name>`
    pub fn discovered(&self, marketplace: &str, plugin: &str, name: &str, body: &str) -> PathBuf {
        let dir = self
            .config
            .discovered_root
            .join(marketplace)
            .join(plugin)
            .join("1.0.0")
            .join("listen.d");
        write_script(&dir, name, body)
    }

    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        write_script(&self.scratch(), name, body)
    }

    /// Number of entries (including hidden ones) in the user directory.
    pub fn user_dir_entries(&self) -> usize {
        fs::read_dir(&self.config.user_dir)
            .map(|rd| rd.count())
            .unwrap_or(0)
    }
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}
