//! Data structures for parsing the agent registry TOML.

use crate::context::Roots;
use crate::state::Scope;
use crate::unit::{entry_name, UnitKind};
use crate::utils::path::resolve;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where one AI coding agent keeps its skills and commands.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,

    /// Existence of this directory means the agent is installed.
    pub config_dir: String,

    pub skills_dir: String,
    pub global_skills_dir: String,

    #[serde(default)]
    pub commands_dir: Option<String>,

    #[serde(default)]
    pub global_commands_dir: Option<String>,
}

impl AgentDescriptor {
    pub fn config_path(&self, roots: &Roots) -> PathBuf {
        resolve(&self.config_dir, &roots.home, &roots.home)
    }

    pub fn skills_path(&self, scope: Scope, roots: &Roots) -> PathBuf {
        let raw = match scope {
            Scope::Project => &self.skills_dir,
            Scope::Global => &self.global_skills_dir,
        };
        resolve(raw, roots.scope_root(scope), &roots.home)
    }

    pub fn commands_path(&self, scope: Scope, roots: &Roots) -> Option<PathBuf> {
        let raw = match scope {
            Scope::Project => self.commands_dir.as_ref(),
            Scope::Global => self.global_commands_dir.as_ref(),
        }?;
        Some(resolve(raw, roots.scope_root(scope), &roots.home))
    }

    pub fn supports_commands(&self) -> bool {
        self.commands_dir.is_some() && self.global_commands_dir.is_some()
    }

    /// Directory holding units of `kind` for this agent, if it has one.
    pub fn unit_dir(&self, kind: UnitKind, scope: Scope, roots: &Roots) -> Option<PathBuf> {
        match kind {
            UnitKind::Skill => Some(self.skills_path(scope, roots)),
            UnitKind::Command => self.commands_path(scope, roots),
        }
    }

    /// Final location of a unit inside this agent's directory.
    pub fn target_path(
        &self,
        kind: UnitKind,
        name: &str,
        scope: Scope,
        roots: &Roots,
    ) -> Option<PathBuf> {
        self.unit_dir(kind, scope, roots)
            .map(|dir| dir.join(entry_name(kind, name)))
    }
}
