// src/watch/poll.rs

//! Polling fallback: compares each direct file's modification time once per
//! interval. Only plain files are supported.

use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{ListenError, Result};
use crate::watch::backend::{poll_refuses_globs, BackendKind, WatchBackend};
use crate::watch::patterns::WatchSpec;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PollBackend {
    interval: Duration,
}

impl Default for PollBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PollBackend {
    pub fn new() -> Self {
        Self {
            interval: POLL_INTERVAL,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn mtime(path: &Path) -> Result<SystemTime> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta
            .modified()
            .with_context(|| format!("reading modification time of {:?}", path))?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ListenError::WatchedFileRemoved(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

impl WatchBackend for PollBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Poll
    }

    fn wait_for_change<'a>(
        &'a self,
        spec: &'a WatchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf>> + Send + 'a>> {
        Box::pin(async move {
            if spec.has_globs() {
                return Err(poll_refuses_globs());
            }

            let mut last: Vec<(PathBuf, SystemTime)> = spec
                .direct_files()
                .map(|p| mtime(p).map(|t| (p.to_path_buf(), t)))
                .collect::<Result<_>>()?;

            info!(files = last.len(), interval = ?self.interval, "polling for changes");

            loop {
                tokio::time::sleep(self.interval).await;

                for (path, seen) in last.iter_mut() {
                    let now = mtime(path)?;
                    if now != *seen {
                        debug!(?path, "modification time changed");
                        return Ok(path.clone());
                    }
                    *seen = now;
                }
            }
        })
    }
}
