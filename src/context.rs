//! Explicit execution context shared by every command.

use crate::agents::AgentRegistry;
use crate::config::Config;
use crate::error::{FlinsError, Result};
use crate::installer::PayloadStore;
use crate::state::{Scope, StateStore};
use crate::ui::Ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the per-user and per-project data directory.
pub const DATA_DIR: &str = ".flins";

/// The two filesystem roots every path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub cwd: PathBuf,
    pub home: PathBuf,
}

impl Roots {
    pub fn new(cwd: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home: home.into(),
        }
    }

    pub fn detect() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = dirs::home_dir().ok_or(FlinsError::HomeNotFound)?;
        Ok(Self::new(cwd, home))
    }

    /// Project scope resolves against the working directory, global against home.
    pub fn scope_root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Project => &self.cwd,
            Scope::Global => &self.home,
        }
    }

    /// `~/.flins`, home of the global lockfile, config and caches.
    pub fn state_dir(&self) -> PathBuf {
        self.home.join(DATA_DIR)
    }
}

pub struct Context {
    pub roots: Roots,
    pub config: Config,
    pub registry: Arc<AgentRegistry>,
    pub silent: bool,
}

impl Context {
    pub fn new(roots: Roots, config: Config, registry: AgentRegistry, silent: bool) -> Self {
        Self {
            roots,
            config,
            registry: Arc::new(registry),
            silent,
        }
    }

    pub fn ui(&self) -> Ui {
        Ui::new(self.silent)
    }

    pub fn store(&self, scope: Scope) -> StateStore {
        StateStore::new(scope, &self.roots, Arc::clone(&self.registry))
    }

    pub fn payload_store(&self, scope: Scope) -> PayloadStore {
        PayloadStore::new(self.roots.scope_root(scope).join(DATA_DIR))
    }

    pub fn display_path(&self, path: &Path) -> String {
        crate::utils::path::display(path, &self.roots.home)
    }
}
