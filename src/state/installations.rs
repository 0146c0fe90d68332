//! Locating a tracked unit on disk.

use super::key::UnitKey;
use super::Scope;
use crate::agents::AgentRegistry;
use crate::context::Roots;
use crate::unit::UnitKind;
use std::io;
use std::path::{Path, PathBuf};

/// One place a unit was found inside an agent directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub agent: String,
    pub scope: Scope,
    pub kind: UnitKind,
    pub path: PathBuf,
}

impl Installation {
    pub fn is_valid(&self) -> bool {
        is_valid_installation(&self.path, self.kind)
    }

    pub fn is_symlink(&self) -> bool {
        std::fs::symlink_metadata(&self.path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false)
    }
}

/// A skill is a directory holding SKILL.md; a command is a `.md` file.
/// Symlinks are followed.
pub fn is_valid_installation(path: &Path, kind: UnitKind) -> bool {
    match kind {
        UnitKind::Skill => path.is_dir() && path.join("SKILL.md").is_file(),
        UnitKind::Command => {
            path.is_file() && path.extension().is_some_and(|ext| ext == "md")
        }
    }
}

/// Result of listing an agent directory.
#[derive(Debug)]
pub enum DirListing {
    Missing,
    Unreadable(io::Error),
    Entries(Vec<PathBuf>),
}

pub fn list_dir(path: &Path) -> DirListing {
    let reader = match std::fs::read_dir(path) {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return DirListing::Missing,
        Err(e) => return DirListing::Unreadable(e),
    };

    let mut entries = Vec::new();
    for entry in reader {
        match entry {
            Ok(entry) => entries.push(entry.path()),
            Err(e) => return DirListing::Unreadable(e),
        }
    }
    entries.sort();
    DirListing::Entries(entries)
}

fn entry_matches(path: &Path, key: &UnitKey) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let file_name = file_name.to_lowercase();
    match key.kind {
        UnitKind::Skill => file_name == key.name(),
        UnitKind::Command => file_name.strip_suffix(".md") == Some(key.name()),
    }
}

/// Find every agent directory in `scope` holding an entry named after `key`.
///
/// Validity is not checked here; callers decide what an invalid match means.
pub fn find_installations(
    registry: &AgentRegistry,
    roots: &Roots,
    scope: Scope,
    key: &UnitKey,
) -> Vec<Installation> {
    let mut found: Vec<Installation> = Vec::new();

    for agent in registry.all() {
        let Some(dir) = agent.unit_dir(key.kind, scope, roots) else {
            continue;
        };

        let entries = match list_dir(&dir) {
            DirListing::Entries(entries) => entries,
            DirListing::Missing => continue,
            DirListing::Unreadable(e) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %e,
                    "skipping unreadable agent directory"
                );
                continue;
            }
        };

        let Some(path) = entries.into_iter().find(|path| entry_matches(path, key)) else {
            continue;
        };
        // Agents sharing a directory report the same entry once.
        if found.iter().any(|existing| existing.path == path) {
            continue;
        }
        found.push(Installation {
            agent: agent.id.clone(),
            scope,
            kind: key.kind,
            path,
        });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_skill(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(&path).unwrap();
        fs::write(
            path.join("SKILL.md"),
            format!("---\nname: {}\ndescription: test\n---\n", name),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_skill_validity() {
        let dir = TempDir::new().unwrap();
        let valid = write_skill(dir.path(), "alpha");
        let empty = dir.path().join("beta");
        fs::create_dir_all(&empty).unwrap();

        assert!(is_valid_installation(&valid, UnitKind::Skill));
        assert!(!is_valid_installation(&empty, UnitKind::Skill));
        assert!(!is_valid_installation(&dir.path().join("missing"), UnitKind::Skill));
    }

    #[test]
    fn test_command_validity() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("review.md");
        let txt = dir.path().join("review.txt");
        fs::write(&md, "# review").unwrap();
        fs::write(&txt, "review").unwrap();

        assert!(is_valid_installation(&md, UnitKind::Command));
        assert!(!is_valid_installation(&txt, UnitKind::Command));
        assert!(!is_valid_installation(dir.path(), UnitKind::Command));
    }

    #[cfg(unix)]
    #[test]
    fn test_validity_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let target = write_skill(&dir.path().join("store"), "alpha");
        let link = dir.path().join("alpha");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(is_valid_installation(&link, UnitKind::Skill));

        fs::remove_dir_all(&target).unwrap();
        assert!(!is_valid_installation(&link, UnitKind::Skill));
    }

    #[test]
    fn test_list_dir_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            list_dir(&dir.path().join("nope")),
            DirListing::Missing
        ));
    }

    #[test]
    fn test_find_installations_across_agents() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let roots = Roots::new(cwd.path(), home.path());
        let registry = AgentRegistry::load().unwrap();

        write_skill(&cwd.path().join(".claude/skills"), "Alpha");
        write_skill(&cwd.path().join(".cursor/skills"), "alpha");
        write_skill(&home.path().join(".codex/skills"), "alpha");

        let found = find_installations(&registry, &roots, Scope::Project, &UnitKey::skill("ALPHA"));
        let agents: Vec<&str> = found.iter().map(|i| i.agent.as_str()).collect();
        assert_eq!(agents, vec!["claude-code", "cursor"]);
        assert!(found.iter().all(|i| i.is_valid()));

        let global = find_installations(&registry, &roots, Scope::Global, &UnitKey::skill("alpha"));
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].agent, "codex");
    }

    #[test]
    fn test_find_command_installations() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let roots = Roots::new(cwd.path(), home.path());
        let registry = AgentRegistry::load().unwrap();

        let commands = cwd.path().join(".claude/commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("Review.md"), "# review").unwrap();

        let found =
            find_installations(&registry, &roots, Scope::Project, &UnitKey::command("review"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, commands.join("Review.md"));

        // A skill with the same name is a different unit
        let skills =
            find_installations(&registry, &roots, Scope::Project, &UnitKey::skill("review"));
        assert!(skills.is_empty());
    }
}
