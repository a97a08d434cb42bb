// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! One `Parser` per binary. All of them share `--log-level`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::watch::BackendChoice;

/// `dispatch`: resolve a source by name and run it, or manage the registry.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dispatch",
    version,
    about = "Resolve an event source by name and run it.",
    long_about = None
)]
pub struct DispatchArgs {
    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<DispatchCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum DispatchCommand {
    /// List every known source across all tiers.
    List {
        /// Print the listing as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Register an executable as a user-tier source.
    Register {
        /// Path to the executable.
        path: PathBuf,

        /// Source name; defaults to the executable's file stem.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Remove a user-tier source alias.
    Unregister { name: String },

    /// Print the path a source name resolves to.
    Which { name: String },

    /// Any other word is a source name; the remaining arguments are passed
    /// through to the source untouched.
    #[command(external_subcommand)]
    Run(Vec<OsString>),
}

/// `file-change`: block until a watched file changes, print its path.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "file-change",
    version,
    about = "Block until a matching file changes, then print its path.",
    long_about = None
)]
pub struct FileChangeArgs {
    /// Directory glob patterns are evaluated against.
    ///
    /// Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Force a watch backend instead of probing.
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub backend: Option<BackendChoice>,

    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Files or glob patterns (`**`, `*`, `?`).
    #[arg(value_name = "PATH_OR_GLOB")]
    pub targets: Vec<String>,
}

/// `heartbeat`: rerun commands until one of their outputs changes.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "heartbeat",
    version,
    about = "Run commands on an interval; report as soon as any output changes.",
    long_about = None
)]
pub struct HeartbeatArgs {
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Seconds between cycles (`5`, `0.5`, `500ms`, `2m`).
    #[arg(value_name = "INTERVAL")]
    pub interval: Option<String>,

    /// Commands as separate words, with `--` between commands
    /// (`5 echo a -- date`).
    ///
    /// Each command runs without a shell, and a literal `--` can't be passed
    /// to it. Wrap such a command in `sh -c '...'`.
    #[arg(
        value_name = "CMD",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub commands: Vec<String>,
}

/// `poll`: rerun one command until its output changes.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "poll",
    version,
    about = "Run a command on an interval; print its new output once it changes.",
    long_about = None
)]
pub struct PollArgs {
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Seconds between cycles (`5`, `0.5`, `500ms`, `2m`).
    #[arg(value_name = "INTERVAL")]
    pub interval: Option<String>,

    /// The command and its arguments as separate words.
    ///
    /// It runs without a shell. For pipes, globbing or a literal `--`, wrap
    /// it in `sh -c '...'`.
    #[arg(
        value_name = "CMD",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse arguments for any of the binaries.
///
/// Usage errors exit with code 1 rather than clap's default of 2; help and
/// version output exit 0.
pub fn parse<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let code = if err.use_stderr() { 1 } else { 0 };
        let _ = err.print();
        std::process::exit(code);
    })
}
