//! On-disk `skills.lock` document.

use super::key::UnitKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LOCKFILE_NAME: &str = "skills.lock";
pub const LOCKFILE_VERSION: &str = "1.0.0";

/// Where a tracked unit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,

    pub branch: String,
    pub commit: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_update: Option<String>,

    skills: BTreeMap<String, StateEntry>,
}

/// Parsed lockfile.
///
/// Keys that do not decode are kept aside and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    pub version: Option<String>,
    pub last_update: Option<String>,
    entries: BTreeMap<UnitKey, StateEntry>,
    unrecognized: BTreeMap<String, StateEntry>,
}

impl Lockfile {
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let document: Document = serde_json::from_str(contents)?;
        let mut lockfile = Lockfile {
            version: document.version,
            last_update: document.last_update,
            ..Default::default()
        };
        for (raw, entry) in document.skills {
            match UnitKey::decode(&raw) {
                Some(key) => {
                    lockfile.entries.insert(key, entry);
                }
                None => {
                    tracing::warn!(key = %raw, "ignoring unrecognized lockfile key");
                    lockfile.unrecognized.insert(raw, entry);
                }
            }
        }
        Ok(lockfile)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut skills = self.unrecognized.clone();
        for (key, entry) in &self.entries {
            skills.insert(key.encode(), entry.clone());
        }
        let document = Document {
            version: self.version.clone(),
            last_update: self.last_update.clone(),
            skills,
        };
        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        Ok(json)
    }

    pub fn get(&self, key: &UnitKey) -> Option<&StateEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &UnitKey) -> Option<&mut StateEntry> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: UnitKey, entry: StateEntry) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &UnitKey) -> Option<StateEntry> {
        self.entries.remove(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&UnitKey, &StateEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unrecognized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_project_document() {
        let json = r#"{
  "version": "1.0.0",
  "skills": {
    "skill:pdf": {
      "url": "https://github.com/acme/skills.git",
      "subpath": "skills/pdf",
      "branch": "main",
      "commit": "abc123"
    },
    "command:review": {
      "url": "https://github.com/acme/skills.git",
      "branch": "main",
      "commit": "abc123"
    }
  }
}"#;
        let lockfile = Lockfile::from_json(json).unwrap();
        assert_eq!(lockfile.version.as_deref(), Some("1.0.0"));
        assert_eq!(lockfile.len(), 2);

        let pdf = lockfile.get(&UnitKey::skill("pdf")).unwrap();
        assert_eq!(pdf.subpath.as_deref(), Some("skills/pdf"));
        assert!(lockfile.get(&UnitKey::command("review")).unwrap().subpath.is_none());
    }

    #[test]
    fn test_writes_camel_case_and_omits_absent_fields() {
        let mut lockfile = Lockfile {
            last_update: Some("2025-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        lockfile.insert(
            UnitKey::skill("pdf"),
            StateEntry {
                url: "u".to_string(),
                subpath: None,
                branch: "main".to_string(),
                commit: "c".to_string(),
            },
        );

        let json = lockfile.to_json().unwrap();
        assert!(json.contains("\"lastUpdate\""));
        assert!(!json.contains("\"version\""));
        assert!(!json.contains("subpath"));
        assert!(json.contains("\"skill:pdf\""));
    }

    #[test]
    fn test_keeps_unrecognized_keys() {
        let json = r#"{"skills": {"legacy": {"url": "u", "branch": "main", "commit": "c"}}}"#;
        let lockfile = Lockfile::from_json(json).unwrap();

        assert_eq!(lockfile.len(), 0);
        assert!(!lockfile.is_empty());
        assert!(lockfile.to_json().unwrap().contains("\"legacy\""));
    }

    #[test]
    fn test_missing_skills_map_is_an_error() {
        assert!(Lockfile::from_json(r#"{"version": "1.0.0"}"#).is_err());
        assert!(Lockfile::from_json("not json").is_err());
    }
}
