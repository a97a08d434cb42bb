// src/watch/fswatch.rs

//! `fswatch` backend.
//!
//! Runs `fswatch -1` with an include-only filter list, so the notifier
//! itself discards every path that no target accepts. The first line it
//! prints is the changed path.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::backend::{BackendKind, WatchBackend};
use crate::watch::patterns::{escape_literal, WatchSpec};

const EVENTS: &[&str] = &["Created", "Updated", "Renamed", "AttributeModified"];

#[derive(Debug, Clone)]
pub struct FswatchBackend {
    program: PathBuf,
}

impl FswatchBackend {
    /// Locate `fswatch` on PATH.
    pub fn probe() -> Option<Self> {
        match which::which("fswatch") {
            Ok(program) => Some(Self { program }),
            Err(err) => {
                debug!(error = %err, "fswatch not found on PATH");
                None
            }
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Command-line arguments for one `fswatch` run over `spec`.
///
/// With globs, each glob's base directory is watched recursively and every
/// target becomes an `--include` regex after a catch-all `--exclude`.
/// Without globs, only the direct files themselves are passed.
pub fn build_args(spec: &WatchSpec) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-1".into()];

    for event in EVENTS {
        args.push("--event".into());
        args.push((*event).into());
    }

    if spec.has_globs() {
        args.push("-r".into());
        args.push("-E".into());
        args.push("--exclude".into());
        args.push(".*".into());

        for glob in spec.globs() {
            args.push("--include".into());
            args.push(glob.regex_source().into());
        }
        for file in spec.direct_files() {
            args.push("--include".into());
            args.push(format!("^{}$", escape_literal(&file.to_string_lossy())).into());
        }

        for dir in spec.glob_watch_dirs() {
            args.push(dir.into_os_string());
        }
    }

    for file in spec.direct_files() {
        args.push(file.as_os_str().to_os_string());
    }

    args
}

impl WatchBackend for FswatchBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fswatch
    }

    fn wait_for_change<'a>(
        &'a self,
        spec: &'a WatchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            let args = build_args(spec);
            debug!(program = ?self.program, ?args, "starting fswatch");

            let mut child = Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("starting {:?}", self.program))?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("fswatch stdout was not captured"))?;
            let mut lines = BufReader::new(stdout).lines();

            info!(root = ?spec.root(), "watching with fswatch");

            while let Some(line) = lines
                .next_line()
                .await
                .context("reading fswatch output")?
            {
                let line = line.trim();
                if !line.is_empty() {
                    return Ok(PathBuf::from(line));
                }
            }

            let status = child.wait().await.context("waiting for fswatch")?;
            Err(anyhow!("fswatch exited ({status}) without reporting a change").into())
        })
    }
}
