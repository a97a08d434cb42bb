// src/exec/source.rs

//! Event sources as runnable capabilities.
//!
//! `dispatch` never inspects what kind of program a source is: it resolves a
//! [`SourceDescriptor`] through the registry tiers and runs it through the
//! [`EventSource`] trait. The source inherits stdio, so its single payload
//! flows straight to the caller's stdout.

use std::ffi::OsString;
use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;
use crate::registry::SourceDescriptor;

/// A blocking, emit-once program.
pub trait EventSource: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    /// Run the source with `args` and return its exit code.
    fn run<'a>(
        &'a self,
        args: &'a [OsString],
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// An on-disk executable found at any tier.
#[derive(Debug, Clone)]
pub struct ExecutableSource {
    descriptor: SourceDescriptor,
}

impl ExecutableSource {
    pub fn new(descriptor: SourceDescriptor) -> Self {
        Self { descriptor }
    }
}

impl EventSource for ExecutableSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    fn run<'a>(
        &'a self,
        args: &'a [OsString],
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let d = &self.descriptor;
            info!(
                source = %d.name,
                tier = %d.tier,
                path = ?d.executable_path,
                "starting event source"
            );

            let mut child = Command::new(&d.executable_path)
                .args(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| {
                    format!("spawning source '{}' at {:?}", d.name, d.executable_path)
                })?;

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for source '{}'", d.name))?;

            let code = exit_code(status);
            debug!(source = %d.name, exit_code = code, "event source exited");
            Ok(code)
        })
    }
}

/// Exit code to propagate; a signal-terminated child maps to `128 + signo`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    1
}
