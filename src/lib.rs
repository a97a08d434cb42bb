// src/lib.rs

pub mod cli;
pub mod config;
pub mod diff;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod watch;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use tracing::debug;

use crate::cli::{DispatchArgs, DispatchCommand, FileChangeArgs, HeartbeatArgs, PollArgs};
use crate::config::load_settings;
use crate::diff::{parse_interval, DiffSession};
use crate::errors::{ListenError, Result};
use crate::exec::{
    split_command_groups, until_shutdown, CommandSpec, EventSource, ExecutableSource,
    ProcessCommand, Runnable,
};
use crate::registry::{ListingEntry, Resolver};
use crate::watch::WatchSpec;

/// Entry point for `dispatch`. Returns the exit code to terminate with.
///
/// Registry maintenance subcommands return 0 on success. Running a source
/// returns that source's own exit code.
pub async fn run_dispatch(args: DispatchArgs) -> Result<i32> {
    let settings = load_settings()?;
    let resolver = Resolver::new(settings.registry);

    let command = args.command.ok_or_else(|| {
        ListenError::MissingArgument(
            "source name (or one of: list, register, unregister, which)".into(),
        )
    })?;

    match command {
        DispatchCommand::List { json } => {
            let entries = resolver.list();
            let text = if json {
                serde_json::to_string_pretty(&entries).context("serializing listing")?
            } else {
                format_listing(&entries)
            };
            emit(&text)?;
            Ok(0)
        }
        DispatchCommand::Register { path, name } => {
            let d = registry::register(resolver.config(), &path, name.as_deref())?;
            emit(&format!("registered {} -> {}", d.name, d.executable_path.display()))?;
            Ok(0)
        }
        DispatchCommand::Unregister { name } => {
            let previous = registry::unregister(resolver.config(), &name)?;
            emit(&format!("unregistered {name} (was {})", previous.display()))?;
            Ok(0)
        }
        DispatchCommand::Which { name } => {
            let d = resolver.resolve(&name)?;
            emit(&format!("{}\t{}", d.executable_path.display(), d.tier))?;
            Ok(0)
        }
        DispatchCommand::Run(argv) => {
            let (name, rest) = argv
                .split_first()
                .ok_or_else(|| ListenError::MissingArgument("source name".into()))?;
            let name = name.to_str().ok_or_else(|| ListenError::UnknownSource {
                name: name.to_string_lossy().into_owned(),
                known: resolver.known_names(),
            })?;
            dispatch_source(&resolver, name, rest).await
        }
    }
}

/// Resolve `name` and run it with `args`, propagating its exit code.
pub async fn dispatch_source(resolver: &Resolver, name: &str, args: &[OsString]) -> Result<i32> {
    let source = ExecutableSource::new(resolver.resolve(name)?);
    until_shutdown(source.run(args)).await
}

/// Human-readable `dispatch list` output.
pub fn format_listing(entries: &[ListingEntry]) -> String {
    if entries.is_empty() {
        return "no event sources found".to_string();
    }

    let width = entries
        .iter()
        .map(|e| e.source.name.len())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|e| {
            let suffix = if e.shadowed { "  (shadowed)" } else { "" };
            format!(
                "{:<width$}  {:<10}  {}{}",
                e.source.name,
                e.source.tier.to_string(),
                e.source.executable_path.display(),
                suffix,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entry point for `file-change`: returns the changed path after printing it.
pub async fn run_file_change(args: FileChangeArgs) -> Result<PathBuf> {
    if args.targets.is_empty() {
        return Err(ListenError::MissingArgument(
            "at least one path or glob pattern".into(),
        ));
    }

    let settings = load_settings()?;
    let cwd = std::env::current_dir().context("reading current directory")?;
    let root = args.root.clone().unwrap_or_else(|| cwd.clone());

    let spec = WatchSpec::new(&root, &args.targets, &cwd)?;
    let choice = args.backend.unwrap_or(settings.watch_backend);

    let path = until_shutdown(watch::wait_for_change(choice, &spec)).await?;
    emit(&path.display().to_string())?;
    Ok(path)
}

/// Entry point for `heartbeat`: prints one JSON change report.
pub async fn run_heartbeat(args: HeartbeatArgs) -> Result<()> {
    let interval = parse_interval(
        args.interval
            .as_deref()
            .ok_or_else(|| ListenError::MissingArgument("interval".into()))?,
    )?;

    let specs = split_command_groups(&args.commands);
    if specs.is_empty() {
        return Err(ListenError::MissingArgument("at least one command".into()));
    }
    debug!(commands = ?specs, ?interval, "starting heartbeat");

    let session = DiffSession::new(boxed_commands(specs), interval);
    let change = until_shutdown(async { Ok(session.run().await) }).await?;

    let report = change.into_report(Utc::now());
    emit(&report.to_json()?)?;
    Ok(())
}

/// Entry point for `poll`: prints the command's new output.
pub async fn run_poll(args: PollArgs) -> Result<()> {
    let interval = parse_interval(
        args.interval
            .as_deref()
            .ok_or_else(|| ListenError::MissingArgument("interval".into()))?,
    )?;
    let spec = CommandSpec::from_argv(&args.command)?;

    let session = DiffSession::new(boxed_commands(vec![spec]), interval);
    let change = until_shutdown(async { Ok(session.run().await) }).await?;

    let new_output = change.current.into_iter().next().unwrap_or_default();
    emit(&new_output)?;
    Ok(())
}

fn boxed_commands(specs: Vec<CommandSpec>) -> Vec<Box<dyn Runnable>> {
    specs
        .into_iter()
        .map(|s| Box::new(ProcessCommand::new(s)) as Box<dyn Runnable>)
        .collect()
}

/// Write the payload plus a newline to stdout and flush it.
fn emit(text: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

/// Print an error for `bin` on stderr in the shape every binary shares.
pub fn report_error(bin: &str, err: &ListenError) {
    if matches!(err, ListenError::Interrupted(_)) {
        return;
    }

    eprintln!("{bin} error: {err}");

    if let ListenError::UnknownSource { known, .. } = err {
        if known.is_empty() {
            eprintln!("no event sources are installed");
        } else {
            eprintln!("known sources:");
            for name in known {
                eprintln!("  {name}");
            }
        }
    }
}
