// src/registry/store.rs

//! Mutations of the user tier.
//!
//! An alias is a symlink `<user_dir>/<name> -> <target>`. Replacement goes
//! through a temporary symlink in the same directory followed by a rename,
//! so a reader never observes a missing or half-written alias.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{ListenError, Result};

use super::{is_executable, source_name, validate_name, RegistryConfig, SourceDescriptor, Tier};

/// Register `path` as a user-tier source.
///
/// The name defaults to the file stem of `path`. Re-registering the same
/// target under the same name is a no-op.
pub fn register(
    config: &RegistryConfig,
    path: &Path,
    name: Option<&str>,
) -> Result<SourceDescriptor> {
    if !path.exists() {
        return Err(ListenError::RegistryConflict(format!(
            "{:?} does not exist",
            path
        )));
    }

    let target = path
        .canonicalize()
        .with_context(|| format!("canonicalizing {:?}", path))?;

    if !is_executable(&target) {
        return Err(ListenError::RegistryConflict(format!(
            "{:?} is not an executable file",
            target
        )));
    }

    let name = match name {
        Some(n) => n.to_string(),
        None => derive_name(&target)?,
    };
    validate_name(&name)?;

    fs::create_dir_all(&config.user_dir)
        .with_context(|| format!("creating user source dir {:?}", config.user_dir))?;

    let alias = config.user_dir.join(&name);

    if fs::read_link(&alias).ok().as_deref() == Some(target.as_path()) {
        debug!(name = %name, ?target, "alias already registered");
        return Ok(descriptor(name, target));
    }

    if let Ok(meta) = fs::symlink_metadata(&alias) {
        if meta.is_dir() {
            return Err(ListenError::RegistryConflict(format!(
                "{:?} exists and is a directory",
                alias
            )));
        }
    }

    replace_alias(&config.user_dir, &alias, &name, &target)?;
    info!(name = %name, ?target, "registered user source");

    Ok(descriptor(name, target))
}

/// Remove the user-tier alias `name`, returning the path it pointed at.
///
/// Fails without touching the filesystem if no such alias exists.
pub fn unregister(config: &RegistryConfig, name: &str) -> Result<PathBuf> {
    let alias = config.user_dir.join(name);

    let meta = match fs::symlink_metadata(&alias) {
        Ok(m) => m,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ListenError::RegistryConflict(format!(
                "no user-registered source named '{name}'"
            )));
        }
        Err(err) => return Err(err.into()),
    };

    if validate_name(name).is_err() || meta.is_dir() {
        return Err(ListenError::RegistryConflict(format!(
            "'{name}' is not a user source alias"
        )));
    }

    let previous = fs::read_link(&alias).unwrap_or_else(|_| alias.clone());
    fs::remove_file(&alias).with_context(|| format!("removing alias {:?}", alias))?;
    info!(name, ?previous, "unregistered user source");

    Ok(previous)
}

fn derive_name(target: &Path) -> Result<String> {
    source_name(target).ok_or_else(|| {
        ListenError::RegistryConflict(format!(
            "cannot derive a source name from {:?}",
            target
        ))
    })
}

fn descriptor(name: String, target: PathBuf) -> SourceDescriptor {
    SourceDescriptor {
        name,
        executable_path: target,
        tier: Tier::User,
    }
}

fn replace_alias(dir: &Path, alias: &Path, name: &str, target: &Path) -> Result<()> {
    let tmp = dir.join(format!(".{name}.tmp-{}", std::process::id()));
    let _ = fs::remove_file(&tmp);

    make_symlink(target, &tmp)
        .with_context(|| format!("creating temporary alias {:?}", tmp))?;

    if let Err(err) = fs::rename(&tmp, alias) {
        let _ = fs::remove_file(&tmp);
        return Err(anyhow::Error::new(err)
            .context(format!("installing alias {:?}", alias))
            .into());
    }

    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
