// src/watch/patterns.rs

//! Glob compilation and watch specifications.
//!
//! Supported wildcards:
//!
//! - `**/` matches zero or more whole path segments
//! - `**` matches anything, separators included
//! - `*` matches within one segment
//! - `?` matches one character other than `/`
//!
//! Every other character is literal. A compiled glob is a regex anchored at
//! both ends against an absolute path. The same regex text is accepted by the
//! `regex` crate and by POSIX extended regex (fswatch `-E`), so one
//! compilation serves every backend.
//!
//! A target with no wildcard is a direct file: it is never compiled and is
//! compared by exact path equality.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;

use crate::errors::{ListenError, Result};
use crate::watch::path_utils::canonical_event_path;

/// Characters that must be escaped to be literal in the generated regex.
const REGEX_SPECIALS: &[char] = &[
    '\\', '.', '^', '$', '+', '(', ')', '[', ']', '{', '}', '|',
];

/// True if `s` contains a wildcard and must be compiled.
pub fn is_glob(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Translate the wildcard grammar into an unanchored regex body.
///
/// Wildcards are matched longest first (`**/`, then `**`, then `*`), so a
/// double star is never read as two single stars.
pub fn glob_to_regex_body(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    while !rest.is_empty() {
        if let Some(r) = rest.strip_prefix("**/") {
            out.push_str("(.*/)?");
            rest = r;
        } else if let Some(r) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = r;
        } else if let Some(r) = rest.strip_prefix('*') {
            out.push_str("[^/]*");
            rest = r;
        } else if let Some(r) = rest.strip_prefix('?') {
            out.push_str("[^/]");
            rest = r;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                push_literal(&mut out, c);
            }
            rest = chars.as_str();
        }
    }

    out
}

/// Escape a literal string for the generated regex dialect.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_literal(&mut out, c);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if REGEX_SPECIALS.contains(&c) || c == '*' || c == '?' {
        out.push('\\');
    }
    out.push(c);
}

/// A glob compiled against a root directory.
#[derive(Clone)]
pub struct CompiledGlob {
    pattern: String,
    source: String,
    regex: Regex,
    /// Deepest directory containing every possible match.
    base_dir: PathBuf,
}

impl fmt::Debug for CompiledGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGlob")
            .field("pattern", &self.pattern)
            .field("regex", &self.source)
            .finish()
    }
}

impl CompiledGlob {
    /// Compile `pattern`. Relative patterns are anchored at `root`; absolute
    /// patterns are anchored at `/`. `.` and `..` segments are folded
    /// lexically first, so `../sibling/*.md` matches real event paths.
    pub fn compile(pattern: &str, root: &Path) -> Result<Self> {
        let (base, rest) = fold_dot_segments(root, pattern);

        let prefix: String = base
            .iter()
            .map(|seg| format!("/{}", escape_literal(seg)))
            .collect();
        let source = format!("^{prefix}/{}$", glob_to_regex_body(&rest.join("/")));

        let literal_dirs = rest
            .iter()
            .take(rest.len().saturating_sub(1))
            .take_while(|seg| !is_glob(seg) && *seg != "..");
        let base_dir = base
            .iter()
            .chain(literal_dirs)
            .fold(PathBuf::from("/"), |dir, seg| dir.join(seg));

        let regex = Regex::new(&source)
            .with_context(|| format!("compiling glob pattern {pattern:?}"))?;

        Ok(Self {
            pattern: pattern.to_string(),
            source,
            regex,
            base_dir,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Directory a notifier must watch recursively to see every match.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The generated regex text, for backends with their own matcher.
    pub fn regex_source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, abs_path: &Path) -> bool {
        self.regex.is_match(&abs_path.to_string_lossy())
    }
}

/// Split `root` + `pattern` into literal base segments and pattern
/// segments, dropping `.` and resolving `..` against the segment before it.
///
/// A `..` directly after a wildcard segment cannot be resolved lexically and
/// is kept as a literal.
fn fold_dot_segments(root: &Path, pattern: &str) -> (Vec<String>, Vec<String>) {
    let mut base: Vec<String> = if pattern.starts_with('/') {
        Vec::new()
    } else {
        root.to_string_lossy()
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .map(str::to_string)
            .collect()
    };
    let mut rest: Vec<String> = Vec::new();

    for seg in pattern.split('/') {
        match seg {
            "" | "." => {}
            ".." => match rest.last() {
                Some(last) if is_glob(last) || last == ".." => rest.push("..".into()),
                Some(_) => {
                    rest.pop();
                }
                None => {
                    base.pop();
                }
            },
            other => rest.push(other.to_string()),
        }
    }

    (base, rest)
}

/// One thing to watch.
#[derive(Debug, Clone)]
pub enum WatchTarget {
    Glob(CompiledGlob),
    /// Canonical absolute path of an existing file.
    DirectFile(PathBuf),
}

impl WatchTarget {
    pub fn matches(&self, abs_path: &Path) -> bool {
        match self {
            WatchTarget::Glob(g) => g.matches(abs_path),
            WatchTarget::DirectFile(p) => p == abs_path,
        }
    }
}

/// Root plus targets for one `file-change` invocation.
#[derive(Debug, Clone)]
pub struct WatchSpec {
    root: PathBuf,
    targets: Vec<WatchTarget>,
}

impl WatchSpec {
    /// Build a spec from raw CLI targets.
    ///
    /// - `root` is canonicalized; globs are anchored at it.
    /// - Direct files are resolved against `cwd` (where the caller named
    ///   them), canonicalized, and must already exist.
    pub fn new(root: &Path, raw_targets: &[String], cwd: &Path) -> Result<Self> {
        if raw_targets.is_empty() {
            return Err(ListenError::MissingArgument(
                "at least one path or glob pattern".into(),
            ));
        }

        let root = absolutize(root, cwd);
        let root = root
            .canonicalize()
            .with_context(|| format!("watch root {:?} does not exist", root))?;
        if !root.is_dir() {
            return Err(ListenError::Config(format!(
                "watch root {:?} is not a directory",
                root
            )));
        }

        let mut targets = Vec::with_capacity(raw_targets.len());
        for raw in raw_targets {
            if is_glob(raw) {
                targets.push(WatchTarget::Glob(CompiledGlob::compile(raw, &root)?));
            } else {
                let path = absolutize(Path::new(raw), cwd);
                let path = path
                    .canonicalize()
                    .with_context(|| format!("watched file {:?} does not exist", path))?;
                if path.is_dir() {
                    return Err(ListenError::Config(format!(
                        "{:?} is a directory; use a glob such as '{}/**' to watch its contents",
                        path, raw
                    )));
                }
                targets.push(WatchTarget::DirectFile(path));
            }
        }

        Ok(Self { root, targets })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    pub fn has_globs(&self) -> bool {
        self.globs().next().is_some()
    }

    pub fn globs(&self) -> impl Iterator<Item = &CompiledGlob> {
        self.targets.iter().filter_map(|t| match t {
            WatchTarget::Glob(g) => Some(g),
            WatchTarget::DirectFile(_) => None,
        })
    }

    /// Directories to watch recursively for the globs: each glob's base
    /// directory (or its nearest existing ancestor), minus any already
    /// covered by another.
    pub fn glob_watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .globs()
            .map(|g| existing_ancestor(g.base_dir()))
            .collect();
        dirs.sort();
        dirs.dedup();

        let mut out: Vec<PathBuf> = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !out.iter().any(|kept| dir.starts_with(kept)) {
                out.push(dir);
            }
        }
        out
    }

    pub fn direct_files(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().filter_map(|t| match t {
            WatchTarget::DirectFile(p) => Some(p.as_path()),
            WatchTarget::Glob(_) => None,
        })
    }

    pub fn is_direct_file(&self, path: &Path) -> bool {
        self.direct_files().any(|p| p == path)
    }

    /// True if any target accepts `abs_path`, trying its canonical form
    /// when the raw event path does not match.
    pub fn matches(&self, abs_path: &Path) -> bool {
        if self.targets.iter().any(|t| t.matches(abs_path)) {
            return true;
        }
        match canonical_event_path(abs_path) {
            Some(canon) if canon != abs_path => {
                self.targets.iter().any(|t| t.matches(&canon))
            }
            _ => false,
        }
    }
}

fn existing_ancestor(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|d| d.is_dir())
        .map(|d| canonical_event_path(d).unwrap_or_else(|| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("/"))
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
