//! Installable units: skills and commands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two kinds of installable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Skill,
    Command,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Skill => "skill",
            UnitKind::Command => "command",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "skill" => Some(UnitKind::Skill),
            "command" => Some(UnitKind::Command),
            _ => None,
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            UnitKind::Skill => "skills",
            UnitKind::Command => "commands",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A directory containing a SKILL.md manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
}

/// A single markdown file found under a `commands/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Skill(Skill),
    Command(Command),
}

impl Unit {
    pub fn name(&self) -> &str {
        match self {
            Unit::Skill(skill) => &skill.name,
            Unit::Command(command) => &command.name,
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Skill(_) => UnitKind::Skill,
            Unit::Command(_) => UnitKind::Command,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Unit::Skill(skill) => Some(&skill.description),
            Unit::Command(command) => command.description.as_deref(),
        }
    }

    /// Where the unit lives in the fetched repository.
    pub fn source_path(&self) -> &Path {
        match self {
            Unit::Skill(skill) => &skill.path,
            Unit::Command(command) => &command.path,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

/// Whether `name` can be used as a single path component.
///
/// Unit names come from untrusted manifests and end up joined onto agent
/// and store directories, so separators, `..` and hidden names are refused.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

/// File or directory name a unit takes inside an agent's directory.
pub fn entry_name(kind: UnitKind, name: &str) -> String {
    match kind {
        UnitKind::Skill => name.to_string(),
        UnitKind::Command => format!("{}.md", name),
    }
}
