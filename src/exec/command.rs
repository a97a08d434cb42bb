// src/exec/command.rs

//! Monitored commands for the diff engine.
//!
//! A command is an argv vector spawned directly; no shell is involved. A
//! caller who wants shell features passes `sh -c '...'` explicitly.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{ListenError, Result};

/// Program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from an argv slice; the first element is the program.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ListenError::MissingArgument("command".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Split CLI words into command groups on `--` separators.
///
/// Empty groups (leading, trailing or doubled separators) are dropped.
pub fn split_command_groups(words: &[String]) -> Vec<CommandSpec> {
    words
        .split(|w| w == "--")
        .filter(|group| !group.is_empty())
        .filter_map(|group| CommandSpec::from_argv(group).ok())
        .collect()
}

/// Captured result of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    /// `None` when the process could not be spawned or was killed.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
        }
    }

    pub fn failed(exit_code: Option<i32>) -> Self {
        Self {
            stdout: String::new(),
            exit_code,
        }
    }

    /// The value compared between cycles: stdout without trailing newlines,
    /// or the empty string if the command failed.
    pub fn comparable(&self) -> String {
        match self.exit_code {
            Some(0) => self.stdout.trim_end_matches(['\n', '\r']).to_string(),
            _ => String::new(),
        }
    }
}

/// Something the diff engine can sample repeatedly.
///
/// Production code uses [`ProcessCommand`]; tests can script outputs.
pub trait Runnable: Send + Sync {
    /// Short human-readable label for logs.
    fn label(&self) -> String;

    /// Run once and capture the output. Never fails: a failure is reported
    /// through `CommandOutput::exit_code`.
    fn execute(&self) -> Pin<Box<dyn Future<Output = CommandOutput> + Send + '_>>;
}

/// Suggestion for a spawn error caused by passing a whole shell command line
/// as the program name (`"echo 5"` instead of `echo 5`).
pub fn spawn_failure_hint(program: &str, err: &io::Error) -> Option<String> {
    if err.kind() != io::ErrorKind::NotFound || !program.contains(char::is_whitespace) {
        return None;
    }
    let quoted = program.replace('\'', r"'\''");
    Some(format!(
        "no program named '{program}'; pass the program and its arguments as \
         separate words, or run it through a shell: sh -c '{quoted}'"
    ))
}

/// Real subprocess, spawned from an argv vector.
#[derive(Debug)]
pub struct ProcessCommand {
    spec: CommandSpec,
    hinted: AtomicBool,
}

impl ProcessCommand {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            hinted: AtomicBool::new(false),
        }
    }
}

impl Runnable for ProcessCommand {
    fn label(&self) -> String {
        self.spec.to_string()
    }

    fn execute(&self) -> Pin<Box<dyn Future<Output = CommandOutput> + Send + '_>> {
        Box::pin(async move {
            let result = Command::new(&self.spec.program)
                .args(&self.spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await;

            match result {
                Ok(out) => {
                    let code = out.status.code();
                    if !out.stderr.is_empty() {
                        debug!(
                            cmd = %self.spec,
                            "stderr: {}",
                            String::from_utf8_lossy(&out.stderr).trim_end()
                        );
                    }
                    if !out.status.success() {
                        let failure = ListenError::CommandFailure {
                            command: self.spec.to_string(),
                            reason: format!("exit status {}", out.status),
                        };
                        debug!("{failure}; treating output as empty");
                        return CommandOutput::failed(code);
                    }
                    CommandOutput {
                        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                        exit_code: code,
                    }
                }
                Err(err) => {
                    if let Some(hint) = spawn_failure_hint(&self.spec.program, &err) {
                        if !self.hinted.swap(true, Ordering::Relaxed) {
                            warn!(cmd = %self.spec, "{hint}");
                        }
                    }
                    let failure = ListenError::CommandFailure {
                        command: self.spec.to_string(),
                        reason: err.to_string(),
                    };
                    debug!("{failure}; treating output as empty");
                    CommandOutput::failed(None)
                }
            }
        })
    }
}
