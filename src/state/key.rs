//! Lockfile keys.
//!
//! Entries are keyed `"<kind>:<lowercased name>"`. [`UnitKey::encode`] and
//! [`UnitKey::decode`] are the only places that format is produced or read.

use crate::unit::{is_safe_name, UnitKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub kind: UnitKind,
    name: String,
}

impl UnitKey {
    pub fn new(kind: UnitKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_lowercase(),
        }
    }

    pub fn skill(name: &str) -> Self {
        Self::new(UnitKind::Skill, name)
    }

    pub fn command(name: &str) -> Self {
        Self::new(UnitKind::Command, name)
    }

    /// Lowercased unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.name)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (kind, name) = raw.split_once(':')?;
        let kind = UnitKind::parse(kind)?;
        if !is_safe_name(name) {
            return None;
        }
        Some(Self::new(kind, name))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name.to_lowercase()
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
