// src/registry/resolver.rs

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::errors::{ListenError, Result};

use super::tiers::enumerate;
use super::{RegistryConfig, SourceDescriptor, Tier};

/// One line of `dispatch list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    #[serde(flatten)]
    pub source: SourceDescriptor,
    /// A higher-priority tier has an entry with the same name.
    pub shadowed: bool,
}

/// Tiered name resolution over a fixed `RegistryConfig`.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: RegistryConfig,
}

impl Resolver {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Resolve `name` to the active descriptor: User, then BuiltIn, then
    /// Discovered. The first tier with a hit wins.
    pub fn resolve(&self, name: &str) -> Result<SourceDescriptor> {
        for tier in Tier::ALL {
            if let Some(found) = enumerate(&self.config, tier)
                .into_iter()
                .find(|d| d.name == name)
            {
                debug!(name, %tier, path = ?found.executable_path, "resolved source");
                return Ok(found);
            }
        }

        Err(ListenError::UnknownSource {
            name: name.to_string(),
            known: self.known_names(),
        })
    }

    /// Every entry of every tier, ordered by tier then name, with lower-tier
    /// duplicates flagged as shadowed.
    pub fn list(&self) -> Vec<ListingEntry> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for tier in Tier::ALL {
            let entries = enumerate(&self.config, tier);
            for source in &entries {
                out.push(ListingEntry {
                    shadowed: seen.contains(&source.name),
                    source: source.clone(),
                });
            }
            seen.extend(entries.into_iter().map(|d| d.name));
        }

        out
    }

    /// Distinct names that currently resolve, sorted.
    pub fn known_names(&self) -> Vec<String> {
        Tier::ALL
            .into_iter()
            .flat_map(|tier| enumerate(&self.config, tier))
            .map(|d| d.name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
