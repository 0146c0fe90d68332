//! Placing unit payloads into agent directories.
//!
//! In copy mode each agent gets its own copy. In symlink mode the unit is
//! materialized once under the scope's `.flins/` store and every agent
//! directory links to it.

use crate::unit::{entry_name, Unit, UnitKind};
use crate::utils::path::link_target;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Files that are never part of an installed payload.
const EXCLUDED_FILES: &[&str] = &["README.md", "metadata.json", ".git"];

pub fn is_excluded(name: &str) -> bool {
    EXCLUDED_FILES.contains(&name) || name.starts_with('_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Copy,
    Symlink,
}

impl InstallMode {
    pub fn from_symlink_flag(symlink: bool) -> Self {
        if symlink {
            InstallMode::Symlink
        } else {
            InstallMode::Copy
        }
    }
}

/// Canonical copies used as symlink targets.
#[derive(Debug, Clone)]
pub struct PayloadStore {
    root: PathBuf,
}

impl PayloadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, kind: UnitKind, name: &str) -> PathBuf {
        self.root.join(kind.plural()).join(entry_name(kind, name))
    }
}

/// Result of installing one unit into one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub path: PathBuf,
    pub error: Option<String>,
}

impl InstallOutcome {
    pub fn ok(path: PathBuf) -> Self {
        Self {
            success: true,
            path,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            success: false,
            path,
            error: Some(error.into()),
        }
    }
}

/// A unit made ready for installation: the path every target is filled from.
pub type Payload = std::result::Result<PathBuf, String>;

#[derive(Debug, Clone)]
pub struct Installer {
    mode: InstallMode,
    store: PayloadStore,
}

impl Installer {
    pub fn new(mode: InstallMode, store: PayloadStore) -> Self {
        Self { mode, store }
    }

    pub fn mode(&self) -> InstallMode {
        self.mode
    }

    /// Get a unit ready for installation.
    ///
    /// Copy mode installs straight from the source. Symlink mode first
    /// replaces the store copy, so call this once per unit before fanning
    /// out to agents.
    pub async fn prepare(&self, unit: &Unit) -> Payload {
        match self.mode {
            InstallMode::Copy => Ok(unit.source_path().to_path_buf()),
            InstallMode::Symlink => {
                let stored = self.store.path_for(unit.kind(), unit.name());
                materialize(unit.kind(), unit.source_path(), &stored)
                    .await
                    .map(|()| stored.clone())
                    .map_err(|e| format!("Failed to write {}: {}", stored.display(), e))
            }
        }
    }

    /// Install a prepared payload at `target`, replacing what is there.
    pub async fn install(
        &self,
        kind: UnitKind,
        payload: &Payload,
        target: &Path,
    ) -> InstallOutcome {
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => return InstallOutcome::failed(target.to_path_buf(), e.clone()),
        };

        let result = match self.mode {
            InstallMode::Copy => copy_into(kind, payload, target).await,
            InstallMode::Symlink => link_into(kind, payload, target).await,
        };

        match result {
            Ok(()) => {
                tracing::debug!(target = %target.display(), mode = ?self.mode, "installed");
                InstallOutcome::ok(target.to_path_buf())
            }
            Err(e) => InstallOutcome::failed(target.to_path_buf(), e.to_string()),
        }
    }
}

async fn materialize(kind: UnitKind, source: &Path, stored: &Path) -> io::Result<()> {
    remove_path(stored).await?;
    match kind {
        UnitKind::Skill => copy_directory(source, stored).await,
        UnitKind::Command => copy_file(source, stored).await,
    }
}

async fn copy_into(kind: UnitKind, payload: &Path, target: &Path) -> io::Result<()> {
    // Writing through a link left by a symlink install would overwrite the store.
    if is_symlink(target).await {
        fs::remove_file(target).await?;
    }
    match kind {
        UnitKind::Skill => copy_directory(payload, target).await,
        UnitKind::Command => copy_file(payload, target).await,
    }
}

async fn link_into(kind: UnitKind, payload: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }
    remove_path(target).await?;
    let relative = link_target(payload, target);
    create_symlink(kind, &relative, target).await
}

#[cfg(unix)]
async fn create_symlink(_kind: UnitKind, original: &Path, link: &Path) -> io::Result<()> {
    fs::symlink(original, link).await
}

#[cfg(windows)]
async fn create_symlink(kind: UnitKind, original: &Path, link: &Path) -> io::Result<()> {
    match kind {
        UnitKind::Skill => fs::symlink_dir(original, link).await,
        UnitKind::Command => fs::symlink_file(original, link).await,
    }
}

async fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Remove a file, symlink or directory tree. Missing paths are fine.
pub async fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn copy_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(source, target).await?;
    Ok(())
}

/// Recursively copy `source` into `target`, skipping excluded files.
pub async fn copy_directory(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target).await?;

    let entries = WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(&entry.file_name().to_string_lossy()))
        .collect::<std::result::Result<Vec<_>, walkdir::Error>>()?;

    for entry in entries {
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).await?;
        } else {
            copy_file(entry.path(), &destination).await?;
        }
    }

    Ok(())
}

/// Result of deleting one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Delete an installation. For a symlink the link target goes too, then the link.
pub async fn remove_installation(path: &Path) -> RemoveOutcome {
    let result = async {
        if is_symlink(path).await {
            // A dangling link has nothing left to delete behind it.
            if let Ok(resolved) = fs::canonicalize(path).await {
                remove_path(&resolved).await?;
            }
        }
        remove_path(path).await
    }
    .await;

    match result {
        Ok(()) => RemoveOutcome {
            success: true,
            error: None,
        },
        Err(e) => RemoveOutcome {
            success: false,
            error: Some(e.to_string()),
        },
    }
}
