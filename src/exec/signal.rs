// src/exec/signal.rs

//! Termination-signal handling.
//!
//! Listeners hold child processes and OS watch handles. Running the work
//! future under [`until_shutdown`] means a signal drops that future, and the
//! drop releases everything it owns (`kill_on_drop` children, `notify`
//! watchers) before the process exits.

use std::future::Future;

use tracing::{info, warn};

use crate::errors::{ListenError, Result};

const SIGHUP: i32 = 1;
const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

/// Drive `work` to completion unless a termination signal arrives first.
pub async fn until_shutdown<F, T>(work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        res = work => res,
        signo = shutdown_signal() => {
            info!(signo, "termination signal received; releasing resources");
            Err(ListenError::Interrupted(signo))
        }
    }
}

/// Resolve with the signal number of the first SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
pub async fn shutdown_signal() -> i32 {
    use tokio::signal::unix::{signal, Signal, SignalKind};

    fn install(kind: SignalKind, label: &str) -> Option<Signal> {
        match signal(kind) {
            Ok(s) => Some(s),
            Err(err) => {
                warn!(signal = label, error = %err, "failed to install signal handler");
                None
            }
        }
    }

    async fn recv(sig: Option<Signal>) {
        match sig {
            Some(mut s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    let term = install(SignalKind::terminate(), "SIGTERM");
    let hup = install(SignalKind::hangup(), "SIGHUP");

    tokio::select! {
        _ = ctrl_c() => SIGINT,
        _ = recv(term) => SIGTERM,
        _ = recv(hup) => SIGHUP,
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() -> i32 {
    ctrl_c().await;
    SIGINT
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
