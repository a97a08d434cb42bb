// src/watch/path_utils.rs

//! Utility functions for path handling in the watchers.

use std::path::{Path, PathBuf};

/// Canonical form of a path reported by an OS watcher.
///
/// Different absolute prefixes may name the same directory (symlinks,
/// `/private/var` on macOS). If the path itself no longer exists (it was
/// just renamed away or deleted), the parent is canonicalized and the file
/// name re-attached.
///
/// Returns `None` if neither the path nor its parent can be resolved.
pub fn canonical_event_path(path: &Path) -> Option<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Some(canon);
    }

    let parent = path.parent()?;
    let name = path.file_name()?;
    parent.canonicalize().ok().map(|p| p.join(name))
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Used for log output; falls back to canonical forms before giving up.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = canonical_event_path(path)?;
    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}
