// src/watch/native.rs

//! In-process notifier backend built on `notify`'s `RecommendedWatcher`
//! (inotify, kqueue or FSEvents depending on the host).

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::anyhow;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{ListenError, Result};
use crate::watch::backend::{BackendKind, WatchBackend};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchSpec;

#[derive(Debug, Clone, Default)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }

    /// Whether the host notifier can be initialised at all.
    pub fn probe() -> bool {
        match RecommendedWatcher::new(|_res: notify::Result<Event>| {}, Config::default()) {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "native notifier unavailable");
                false
            }
        }
    }
}

/// What an OS event means for a [`WatchSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventVerdict {
    Changed(PathBuf),
    DirectFileRemoved(PathBuf),
    Ignored,
}

/// Classify one `notify` event against `spec`.
///
/// Creates and modifications (content, metadata, rename) qualify. Removing a
/// direct file, or renaming it away so nothing is left at its path, is a
/// failure. Everything else is ignored.
pub fn classify_event(spec: &WatchSpec, event: &Event) -> EventVerdict {
    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Both)) => {
            // The rename source comes first.
            match event
                .paths
                .first()
                .filter(|p| spec.is_direct_file(p) && !p.exists())
            {
                Some(gone) => EventVerdict::DirectFileRemoved(gone.clone()),
                None => first_match(spec, event),
            }
        }
        EventKind::Create(_) | EventKind::Modify(_) => first_match(spec, event),
        EventKind::Remove(_) => event
            .paths
            .iter()
            .find(|p| spec.is_direct_file(p))
            .map(|p| EventVerdict::DirectFileRemoved(p.clone()))
            .unwrap_or(EventVerdict::Ignored),
        _ => EventVerdict::Ignored,
    }
}

fn first_match(spec: &WatchSpec, event: &Event) -> EventVerdict {
    event
        .paths
        .iter()
        .find(|p| spec.matches(p))
        .map(|p| EventVerdict::Changed(p.clone()))
        .unwrap_or(EventVerdict::Ignored)
}

/// Directories to register with the notifier, with their recursion mode.
///
/// Direct files are watched through their parent directory so atomic saves
/// (write to a temp file, rename over) are still seen.
fn watch_roots(spec: &WatchSpec) -> Vec<(PathBuf, RecursiveMode)> {
    let recursive = spec.glob_watch_dirs();
    let mut roots: Vec<(PathBuf, RecursiveMode)> = recursive
        .iter()
        .map(|dir| (dir.clone(), RecursiveMode::Recursive))
        .collect();

    let parents: BTreeSet<&Path> = spec.direct_files().filter_map(Path::parent).collect();
    for parent in parents {
        let covered = recursive.iter().any(|dir| parent.starts_with(dir));
        if !covered {
            roots.push((parent.to_path_buf(), RecursiveMode::NonRecursive));
        }
    }

    roots
}

impl WatchBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn wait_for_change<'a>(
        &'a self,
        spec: &'a WatchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            // Channel from the blocking notify callback into the async world.
            let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

            let mut watcher = RecommendedWatcher::new(
                move |res: notify::Result<Event>| {
                    // The receiver is gone once a change has been reported.
                    let _ = event_tx.send(res);
                },
                Config::default(),
            )
            .map_err(|e| anyhow!("initialising file notifier: {e}"))?;

            for (dir, mode) in watch_roots(spec) {
                watcher
                    .watch(&dir, mode)
                    .map_err(|e| anyhow!("watching {:?}: {e}", dir))?;
                debug!(?dir, ?mode, "registered watch");
            }

            info!(root = ?spec.root(), "watching with native notifier");

            while let Some(res) = event_rx.recv().await {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        warn!("file watch error: {err}");
                        continue;
                    }
                };

                match classify_event(spec, &event) {
                    EventVerdict::Changed(path) => {
                        debug!(
                            rel = ?relative_str(spec.root(), &path),
                            kind = ?event.kind,
                            "qualifying change"
                        );
                        // Dropping `watcher` on return unregisters every watch.
                        return Ok(path);
                    }
                    EventVerdict::DirectFileRemoved(path) => {
                        return Err(ListenError::WatchedFileRemoved(path));
                    }
                    EventVerdict::Ignored => {}
                }
            }

            Err(anyhow!("file notifier stopped without reporting a change").into())
        })
    }
}
