//! Tracked units in project (`./skills.lock`) and global
//! (`~/.flins/skills.lock`) scope.

pub mod installations;
pub mod key;
pub mod lockfile;
pub mod store;

pub use installations::{find_installations, is_valid_installation, DirListing, Installation};
pub use key::UnitKey;
pub use lockfile::{Lockfile, StateEntry, LOCKFILE_NAME};
pub use store::{AddOutcome, LoadOutcome, StateStore};

use crate::error::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Project,
    Global,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Project => "project",
            Scope::Global => "global",
        }
    }

    pub fn from_global_flag(global: bool) -> Self {
        if global {
            Scope::Global
        } else {
            Scope::Project
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A lockfile entry together with the scope it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedUnit {
    pub key: UnitKey,
    pub entry: StateEntry,
    pub scope: Scope,
}

/// Every tracked unit across both scopes.
///
/// A project entry shadows a global entry with the same key.
pub fn tracked_units(project: &StateStore, global: &StateStore) -> Result<Vec<TrackedUnit>> {
    let mut units: Vec<TrackedUnit> = project
        .entries()?
        .into_iter()
        .map(|(key, entry)| TrackedUnit {
            key,
            entry,
            scope: Scope::Project,
        })
        .collect();

    for (key, entry) in global.entries()? {
        if units.iter().any(|unit| unit.key == key) {
            continue;
        }
        units.push(TrackedUnit {
            key,
            entry,
            scope: Scope::Global,
        });
    }

    Ok(units)
}
