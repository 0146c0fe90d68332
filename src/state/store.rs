//! One lockfile algorithm for both scopes.
//!
//! Project and global stores differ only in where the file lives, how it
//! is stamped, and what happens when it is missing or emptied.

use super::installations::{find_installations, Installation};
use super::key::UnitKey;
use super::lockfile::{Lockfile, StateEntry, LOCKFILE_NAME, LOCKFILE_VERSION};
use super::Scope;
use crate::agents::AgentRegistry;
use crate::context::Roots;
use crate::error::Result;
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What reading the lockfile produced.
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    Corrupt(String),
    Loaded(Lockfile),
}

/// Result of [`StateStore::add`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddOutcome {
    /// The entry existed on another branch and was moved.
    pub updated: bool,
    pub previous_branch: Option<String>,
}

pub struct StateStore {
    scope: Scope,
    path: PathBuf,
    roots: Roots,
    registry: Arc<AgentRegistry>,
}

impl StateStore {
    pub fn new(scope: Scope, roots: &Roots, registry: Arc<AgentRegistry>) -> Self {
        let path = match scope {
            Scope::Project => roots.cwd.join(LOCKFILE_NAME),
            Scope::Global => roots.state_dir().join(LOCKFILE_NAME),
        };
        Self {
            scope,
            path,
            roots: roots.clone(),
            registry,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn read(&self) -> LoadOutcome {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) => return LoadOutcome::Corrupt(e.to_string()),
        };
        match Lockfile::from_json(&contents) {
            Ok(lockfile) => LoadOutcome::Loaded(lockfile),
            Err(e) => LoadOutcome::Corrupt(e.to_string()),
        }
    }

    /// Load the lockfile.
    ///
    /// A corrupt file reads as empty. A missing global file is created
    /// empty; a missing project file is not.
    pub fn load(&self) -> Result<Lockfile> {
        match self.read() {
            LoadOutcome::Loaded(lockfile) => Ok(lockfile),
            LoadOutcome::Corrupt(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "lockfile is unreadable, treating as empty"
                );
                Ok(Lockfile::default())
            }
            LoadOutcome::Missing => {
                let mut lockfile = Lockfile::default();
                if self.scope == Scope::Global {
                    self.save(&mut lockfile)?;
                }
                Ok(lockfile)
            }
        }
    }

    /// Persist `lockfile`. An emptied project lockfile is deleted instead.
    pub fn save(&self, lockfile: &mut Lockfile) -> Result<()> {
        match self.scope {
            Scope::Project => {
                if lockfile.is_empty() {
                    if self.path.exists() {
                        fs::remove_file(&self.path)?;
                        tracing::debug!(path = %self.path.display(), "removed empty lockfile");
                    }
                    return Ok(());
                }
                lockfile.version = Some(LOCKFILE_VERSION.to_string());
            }
            Scope::Global => {
                lockfile.last_update =
                    Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, lockfile.to_json()?)?;
        tracing::debug!(path = %self.path.display(), entries = lockfile.len(), "saved lockfile");
        Ok(())
    }

    /// Record that `key` was installed from `source`.
    ///
    /// A new key is inserted as given. For an existing key the URL and
    /// commit are refreshed and the subpath replaced only when one is
    /// given; a branch change is reported through [`AddOutcome`].
    pub fn add(&self, key: &UnitKey, source: StateEntry) -> Result<AddOutcome> {
        let mut lockfile = self.load()?;
        let mut outcome = AddOutcome::default();

        match lockfile.get_mut(key) {
            None => lockfile.insert(key.clone(), source),
            Some(existing) => {
                if existing.branch != source.branch {
                    outcome.updated = true;
                    outcome.previous_branch = Some(existing.branch.clone());
                    existing.branch = source.branch;
                }
                existing.url = source.url;
                existing.commit = source.commit;
                if source.subpath.is_some() {
                    existing.subpath = source.subpath;
                }
            }
        }

        self.save(&mut lockfile)?;
        Ok(outcome)
    }

    /// Drop `key`. Returns whether it was tracked.
    pub fn remove(&self, key: &UnitKey) -> Result<bool> {
        if self.scope == Scope::Project && !self.exists() {
            return Ok(false);
        }
        let mut lockfile = self.load()?;
        let removed = lockfile.remove(key).is_some();
        if removed {
            self.save(&mut lockfile)?;
        }
        Ok(removed)
    }

    pub fn get(&self, key: &UnitKey) -> Result<Option<StateEntry>> {
        Ok(self.load()?.get(key).cloned())
    }

    /// Move a tracked entry to a new commit. Untracked keys are ignored.
    pub fn set_commit(&self, key: &UnitKey, commit: &str) -> Result<()> {
        let mut lockfile = self.load()?;
        if let Some(entry) = lockfile.get_mut(key) {
            entry.commit = commit.to_string();
            self.save(&mut lockfile)?;
        }
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<(UnitKey, StateEntry)>> {
        Ok(self
            .load()?
            .entries()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect())
    }

    pub fn find_installations(&self, key: &UnitKey) -> Vec<Installation> {
        find_installations(&self.registry, &self.roots, self.scope, key)
    }

    pub fn valid_installations(&self, key: &UnitKey) -> Vec<Installation> {
        self.find_installations(key)
            .into_iter()
            .filter(Installation::is_valid)
            .collect()
    }

    /// Drop every entry with no valid installation. Returns the dropped keys.
    pub fn clean_orphaned(&self) -> Result<Vec<UnitKey>> {
        let mut lockfile = self.load()?;
        let orphaned: Vec<UnitKey> = lockfile
            .entries()
            .map(|(key, _)| key.clone())
            .filter(|key| self.valid_installations(key).is_empty())
            .collect();

        if orphaned.is_empty() {
            return Ok(orphaned);
        }
        for key in &orphaned {
            tracing::debug!(key = %key, scope = %self.scope, "dropping orphaned entry");
            lockfile.remove(key);
        }
        self.save(&mut lockfile)?;
        Ok(orphaned)
    }
}
