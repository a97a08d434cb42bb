// src/diff/mod.rs

//! Multi-command change detection.
//!
//! A session runs every command once to capture a baseline, then repeatedly
//! sleeps, re-runs all commands in their original order and compares each
//! output with that same command's previous sample. The first cycle with at
//! least one difference ends the session.
//!
//! ```text
//! Init -> Baseline -> Cycling <-> Cycling -> Reporting
//! ```
//!
//! A failed command samples as the empty string, so failure turning into
//! success (or back) is an ordinary change.

pub mod interval;
pub mod report;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::exec::Runnable;

pub use interval::parse_interval;
pub use report::{command_key, ChangeReport, CommandResult};

/// Outputs of the cycle that diverged, alongside the samples before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Indices whose output differs from the previous sample. Never empty.
    pub changed: Vec<usize>,
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

impl ChangeSet {
    /// Report covering every command, listing only the changed ones.
    pub fn into_report(self, timestamp: DateTime<Utc>) -> ChangeReport {
        let results = self
            .previous
            .into_iter()
            .zip(self.current)
            .map(|(old, new)| CommandResult { old, new })
            .collect();

        ChangeReport {
            changed: self.changed,
            results,
            timestamp,
        }
    }
}

pub struct DiffSession {
    commands: Vec<Box<dyn Runnable>>,
    interval: Duration,
    /// Last sample per command, by index. `None` until the baseline ran.
    last: Option<Vec<String>>,
    cycles: u64,
}

impl DiffSession {
    pub fn new(commands: Vec<Box<dyn Runnable>>, interval: Duration) -> Self {
        Self {
            commands,
            interval,
            last: None,
            cycles: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Completed comparison cycles, excluding the baseline.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Last stored sample per command (empty before the baseline).
    pub fn last_samples(&self) -> &[String] {
        self.last.as_deref().unwrap_or(&[])
    }

    /// Run every command once and store the result. Never reports.
    pub async fn capture_baseline(&mut self) {
        let baseline = self.sample_all().await;
        info!(
            commands = self.commands.len(),
            interval = ?self.interval,
            "baseline captured"
        );
        self.last = Some(baseline);
    }

    /// One comparison cycle, without sleeping.
    ///
    /// Returns `Some` if any output differs from its previous sample;
    /// otherwise stores the new samples and returns `None`. Captures the
    /// baseline first if that has not happened yet.
    pub async fn cycle(&mut self) -> Option<ChangeSet> {
        let Some(previous) = self.last.take() else {
            self.capture_baseline().await;
            return None;
        };

        let current = self.sample_all().await;
        self.cycles += 1;

        let changed: Vec<usize> = previous
            .iter()
            .zip(&current)
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(i, _)| i)
            .collect();

        if changed.is_empty() {
            debug!(cycle = self.cycles, "no change");
            self.last = Some(current);
            return None;
        }

        info!(cycle = self.cycles, ?changed, "output changed");
        self.last = Some(current.clone());
        Some(ChangeSet {
            changed,
            previous,
            current,
        })
    }

    /// Baseline, then sleep/compare until the first change.
    pub async fn run(mut self) -> ChangeSet {
        if self.last.is_none() {
            self.capture_baseline().await;
        }

        loop {
            tokio::time::sleep(self.interval).await;
            if let Some(change) = self.cycle().await {
                return change;
            }
        }
    }

    /// Sequential, in input order; cycle cost is the sum of command
    /// latencies.
    async fn sample_all(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.commands.len());
        for (i, cmd) in self.commands.iter().enumerate() {
            let output = cmd.execute().await;
            debug!(
                index = i,
                cmd = %cmd.label(),
                exit_code = ?output.exit_code,
                "sampled command"
            );
            out.push(output.comparable());
        }
        out
    }
}
