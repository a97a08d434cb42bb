// src/registry/mod.rs

//! Source-name registry.
//!
//! A source name resolves to an executable through three tiers, checked in
//! order:
//!
//! 1. `User`: aliases (symlinks) in the user directory, managed by
//!    `register` / `unregister`.
//! 2. `BuiltIn`: executables shipped next to `dispatch`.
//! 3. `Discovered`: executables in `listen.d` directories of installed
//!    third-party plugins.
//!
//! Nothing is cached; every call re-reads the directories.

pub mod resolver;
pub mod store;
pub mod tiers;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::{ListenError, Result};

pub use resolver::{ListingEntry, Resolver};
pub use store::{register, unregister};

/// Names that `dispatch` itself claims as subcommands.
pub const RESERVED_NAMES: &[&str] = &["list", "register", "unregister", "which"];

/// Directory name that marks a plugin's event sources.
pub const DISCOVERY_DIR_NAME: &str = "listen.d";

/// Where each tier lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub user_dir: PathBuf,
    pub builtin_dir: PathBuf,
    pub discovered_root: PathBuf,
    /// Owning plugin name whose `listen.d` entries discovery must skip.
    pub self_plugin: String,
}

/// Resolution priority class. Lower sorts first and wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    User,
    #[serde(rename = "builtin")]
    BuiltIn,
    Discovered,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::User, Tier::BuiltIn, Tier::Discovered];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::User => "user",
            Tier::BuiltIn => "builtin",
            Tier::Discovered => "discovered",
        };
        f.write_str(s)
    }
}

/// A name bound to an executable at a given tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(rename = "path")]
    pub executable_path: PathBuf,
    pub tier: Tier,
}

/// Check that `name` can be used as a source name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ListenError::RegistryConflict("empty source name".into()));
    }
    if name.starts_with('.') || name.contains('/') || name.contains('\\') {
        return Err(ListenError::RegistryConflict(format!(
            "invalid source name '{name}'"
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ListenError::RegistryConflict(format!(
            "'{name}' is reserved by dispatch"
        )));
    }
    Ok(())
}

/// Source name for an executable: its file stem (`watch-ci.sh` →
/// `watch-ci`). `None` for paths without a UTF-8 file name.
pub fn source_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Whether a directory entry name could be a source at all.
pub(crate) fn is_candidate_name(name: &str) -> bool {
    !name.starts_with('.') && !RESERVED_NAMES.contains(&name)
}

/// True if `path` (following symlinks) is a regular file with an execute
/// bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
