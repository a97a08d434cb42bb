// src/diff/report.rs

//! The `heartbeat` payload.
//!
//! ```json
//! {"changed":["cmd_0"],
//!  "results":{"cmd_0":{"old":"5","new":"6"},"cmd_1":{"old":"ok","new":"ok"}},
//!  "timestamp":"2026-01-01T00:00:00Z"}
//! ```
//!
//! Keys are serialized in index order, so `cmd_10` follows `cmd_9`.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::errors::Result;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Stable key for the command at `index`.
pub fn command_key(index: usize) -> String {
    format!("cmd_{index}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub old: String,
    pub new: String,
}

/// Change report covering every command; only diverged indices are listed
/// in `changed`, which is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub changed: Vec<usize>,
    pub results: Vec<CommandResult>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| anyhow::Error::from(e).into())
    }
}

struct IndexedResults<'a>(&'a [CommandResult]);

impl Serialize for IndexedResults<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, result) in self.0.iter().enumerate() {
            map.serialize_entry(&command_key(i), result)?;
        }
        map.end()
    }
}

impl Serialize for ChangeReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let changed: Vec<String> = self.changed.iter().map(|&i| command_key(i)).collect();

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("changed", &changed)?;
        map.serialize_entry("results", &IndexedResults(&self.results))?;
        map.serialize_entry(
            "timestamp",
            &self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        )?;
        map.end()
    }
}
