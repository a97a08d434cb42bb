// src/watch/backend.rs

//! Watch backend selection.
//!
//! Backends are picked at startup by probing, most precise first:
//!
//! 1. `fswatch` on PATH: external notifier with include-only filters.
//! 2. `native`: in-process recursive notifier (`notify`), filtered by the
//!    compiled glob regexes.
//! 3. `poll`: mtime polling of direct files once per second. Globs are
//!    refused here rather than walking the tree every cycle.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{ListenError, Result};
use crate::watch::fswatch::FswatchBackend;
use crate::watch::native::NativeBackend;
use crate::watch::patterns::WatchSpec;
use crate::watch::poll::PollBackend;

/// Backend requested by the user or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Auto,
    Fswatch,
    Native,
    Poll,
}

impl FromStr for BackendChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(BackendChoice::Auto),
            "fswatch" => Ok(BackendChoice::Fswatch),
            "native" => Ok(BackendChoice::Native),
            "poll" => Ok(BackendChoice::Poll),
            other => Err(format!(
                "invalid watch backend: {other} (expected auto, fswatch, native or poll)"
            )),
        }
    }
}

/// Concrete backend actually in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Fswatch,
    Native,
    Poll,
}

/// A mechanism that blocks until one path in a `WatchSpec` changes.
pub trait WatchBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Resolve with the first qualifying changed path. Exactly one path is
    /// reported; nothing is batched or coalesced.
    fn wait_for_change<'a>(
        &'a self,
        spec: &'a WatchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>>;
}

/// Pick a backend for `spec`, failing fast if none can serve it.
pub fn select_backend(choice: BackendChoice, spec: &WatchSpec) -> Result<Box<dyn WatchBackend>> {
    let backend: Box<dyn WatchBackend> = match choice {
        BackendChoice::Fswatch => Box::new(
            FswatchBackend::probe()
                .ok_or_else(|| ListenError::ToolMissing("fswatch".into()))?,
        ),
        BackendChoice::Native => {
            if !NativeBackend::probe() {
                return Err(ListenError::BackendUnavailable {
                    reason: "the native file notifier could not be initialised".into(),
                    hint: "raise the inotify instance limit or use --backend poll".into(),
                });
            }
            Box::new(NativeBackend::new())
        }
        BackendChoice::Poll => Box::new(PollBackend::new()),
        BackendChoice::Auto => {
            if let Some(fswatch) = FswatchBackend::probe() {
                Box::new(fswatch)
            } else if NativeBackend::probe() {
                Box::new(NativeBackend::new())
            } else {
                debug!("no notifier available; falling back to polling");
                Box::new(PollBackend::new())
            }
        }
    };

    if backend.kind() == BackendKind::Poll && spec.has_globs() {
        return Err(poll_refuses_globs());
    }

    info!(backend = ?backend.kind(), "selected watch backend");
    Ok(backend)
}

pub(crate) fn poll_refuses_globs() -> ListenError {
    ListenError::BackendUnavailable {
        reason: "glob patterns need a file notifier; the polling fallback only watches plain files"
            .into(),
        hint: "install fswatch (e.g. `brew install fswatch` or `apt install fswatch`), \
               or pass explicit file paths instead of globs"
            .into(),
    }
}
