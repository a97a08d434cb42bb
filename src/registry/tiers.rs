// src/registry/tiers.rs

//! Enumeration of each tier's entries from disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{
    is_candidate_name, is_executable, source_name, RegistryConfig, SourceDescriptor, Tier,
    DISCOVERY_DIR_NAME,
};

/// How deep below the plugin cache a `listen.d` directory may sit.
const DISCOVERY_MAX_DEPTH: usize = 6;

/// File name of the dispatcher binary, never listed as a built-in.
const DISPATCH_BIN: &str = "dispatch";

/// All entries of one tier, sorted by name, at most one per name.
pub fn enumerate(config: &RegistryConfig, tier: Tier) -> Vec<SourceDescriptor> {
    match tier {
        Tier::User => enumerate_user(&config.user_dir),
        Tier::BuiltIn => enumerate_builtin(&config.builtin_dir),
        Tier::Discovered => {
            enumerate_discovered(&config.discovered_root, &config.self_plugin)
        }
    }
}

/// User aliases. A symlink resolves to its target; a plain executable file
/// placed in the directory is used as-is. Dangling aliases are skipped.
pub fn enumerate_user(user_dir: &Path) -> Vec<SourceDescriptor> {
    let mut out = Vec::new();

    for (name, path) in candidate_entries(user_dir) {
        let target = match fs::read_link(&path) {
            Ok(link) if link.is_relative() => user_dir.join(link),
            Ok(link) => link,
            Err(_) => path.clone(),
        };

        if !is_executable(&target) {
            warn!(
                alias = %name,
                target = ?target,
                "user alias does not point at an executable; ignoring"
            );
            continue;
        }

        out.push(SourceDescriptor {
            name,
            executable_path: target,
            tier: Tier::User,
        });
    }

    out
}

pub fn enumerate_builtin(builtin_dir: &Path) -> Vec<SourceDescriptor> {
    named_executables(builtin_dir)
        .into_iter()
        .filter(|(name, _)| name != DISPATCH_BIN)
        .map(|(name, path)| SourceDescriptor {
            name,
            executable_path: path,
            tier: Tier::BuiltIn,
        })
        .collect()
}

/// Executables in `<root>/<marketplace>/<plugin>/.../listen.d/`.
///
/// The owning plugin is the second component below `root`; entries owned by
/// `self_plugin` are skipped. When two plugins ship the same name, the one
/// with the lexicographically smaller path wins.
pub fn enumerate_discovered(root: &Path, self_plugin: &str) -> Vec<SourceDescriptor> {
    if !root.is_dir() {
        debug!(?root, "plugin cache does not exist; no discovered sources");
        return Vec::new();
    }

    let mut found: Vec<SourceDescriptor> = Vec::new();

    let walker = WalkDir::new(root)
        .max_depth(DISCOVERY_MAX_DEPTH)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!(error = %err, "skipping unreadable plugin cache entry");
                continue;
            }
        };

        if !entry.file_type().is_dir() || entry.file_name() != DISCOVERY_DIR_NAME {
            continue;
        }

        let dir = entry.path();
        if owning_plugin(root, dir).as_deref() == Some(self_plugin) {
            debug!(?dir, "skipping own plugin's sources");
            continue;
        }

        for (name, path) in named_executables(dir) {
            found.push(SourceDescriptor {
                name,
                executable_path: path,
                tier: Tier::Discovered,
            });
        }
    }

    found.sort_by(|a, b| a.executable_path.cmp(&b.executable_path));

    let mut seen = HashSet::new();
    found.retain(|d| seen.insert(d.name.clone()));
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

fn owning_plugin(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .nth(1)
}

/// Executables in `dir` keyed by source name (file stem), the same way
/// `register` names an alias. When `ci` and `ci.sh` both exist, the entry
/// whose file name sorts first wins.
fn named_executables(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut seen = HashSet::new();
    candidate_entries(dir)
        .into_iter()
        .filter(|(_, path)| is_executable(path))
        .filter_map(|(_, path)| {
            let name = source_name(&path)?;
            (is_candidate_name(&name) && seen.insert(name.clone())).then_some((name, path))
        })
        .collect()
}

/// Non-hidden, non-reserved entries of `dir`, sorted by file name.
fn candidate_entries(dir: &Path) -> Vec<(String, PathBuf)> {
    let read = match fs::read_dir(dir) {
        Ok(r) => r,
        Err(err) => {
            debug!(?dir, error = %err, "cannot read source directory");
            return Vec::new();
        }
    };

    let mut entries: Vec<(String, PathBuf)> = read
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            is_candidate_name(&name).then(|| (name, e.path()))
        })
        .collect();

    entries.sort();
    entries
}
