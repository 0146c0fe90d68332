//! Finding skills and commands inside a fetched repository.

pub mod commands;
pub mod frontmatter;
pub mod skills;

pub use commands::discover_commands;
pub use frontmatter::{parse_frontmatter, Frontmatter};
pub use skills::discover_skills;

use crate::agents::AgentRegistry;
use crate::unit::{Command, Skill, Unit};
use std::path::{Path, PathBuf};

/// Directories never descended into while scanning.
pub const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "__pycache__"];

/// Maximum recursion depth below the search root.
pub const MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct Discovered {
    pub skills: Vec<Skill>,
    pub commands: Vec<Command>,
}

impl Discovered {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.commands.is_empty()
    }

    pub fn units(&self) -> Vec<Unit> {
        self.skills
            .iter()
            .cloned()
            .map(Unit::Skill)
            .chain(self.commands.iter().cloned().map(Unit::Command))
            .collect()
    }
}

pub fn search_path(root: &Path, subpath: Option<&str>) -> PathBuf {
    match subpath {
        Some(subpath) => root.join(subpath),
        None => root.to_path_buf(),
    }
}

/// Discover every skill and command under `root` (or `root/subpath`).
pub fn discover(root: &Path, subpath: Option<&str>, registry: &AgentRegistry) -> Discovered {
    let search = search_path(root, subpath);
    let discovered = Discovered {
        skills: discover_skills(&search, registry),
        commands: discover_commands(&search),
    };
    tracing::debug!(
        path = %search.display(),
        skills = discovered.skills.len(),
        commands = discovered.commands.len(),
        "discovery finished"
    );
    discovered
}

pub(crate) fn is_skipped_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name)
}
