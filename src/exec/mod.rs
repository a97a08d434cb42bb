// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs monitored commands for the diff engine and captures
//!   their stdout.
//! - [`source`] runs a resolved event source with inherited stdio.
//! - [`signal`] ties every blocking operation to termination signals so
//!   child processes never outlive the listener.

pub mod command;
pub mod signal;
pub mod source;

pub use command::{
    spawn_failure_hint, split_command_groups, CommandOutput, CommandSpec, ProcessCommand,
    Runnable,
};
pub use signal::{shutdown_signal, until_shutdown};
pub use source::{EventSource, ExecutableSource};
