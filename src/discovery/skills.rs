use super::frontmatter::parse_frontmatter;
use super::{is_skipped_dir, MAX_DEPTH};
use crate::agents::AgentRegistry;
use crate::unit::{is_safe_name, Skill};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST: &str = "SKILL.md";

/// Conventional skill locations checked before any recursive scan.
const PRIORITY_DIRS: &[&str] = &[
    "skills",
    "skills/.curated",
    "skills/.experimental",
    "skills/.system",
];

/// Read `dir/SKILL.md`. A skill needs both `name` and `description`.
pub fn parse_skill_manifest(dir: &Path) -> Option<Skill> {
    let content = fs::read_to_string(dir.join(MANIFEST)).ok()?;
    let frontmatter = parse_frontmatter(&content);
    let name = frontmatter.get("name")?;
    let description = frontmatter.get("description")?;
    if !is_safe_name(name) {
        tracing::warn!(path = %dir.display(), name, "skipping skill with an unusable name");
        return None;
    }
    Some(Skill {
        name: name.to_string(),
        description: description.to_string(),
        path: dir.to_path_buf(),
    })
}

#[derive(Default)]
struct SkillSet {
    seen: HashSet<String>,
    skills: Vec<Skill>,
}

impl SkillSet {
    fn push(&mut self, skill: Skill) {
        if self.seen.insert(skill.name.to_lowercase()) {
            self.skills.push(skill);
        }
    }
}

fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(reader) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = reader
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !is_skipped_dir(name))
        })
        .collect();
    dirs.sort();
    dirs
}

/// Discover skills below `search`.
///
/// A manifest at `search` itself means the path is a single skill. Otherwise
/// the immediate children of the conventional skill directories (and each
/// agent's project skills directory) are checked, and only when that finds
/// nothing is the tree scanned recursively.
pub fn discover_skills(search: &Path, registry: &AgentRegistry) -> Vec<Skill> {
    if let Some(skill) = parse_skill_manifest(search) {
        return vec![skill];
    }

    let mut found = SkillSet::default();

    let mut priority: Vec<PathBuf> = vec![search.to_path_buf()];
    priority.extend(PRIORITY_DIRS.iter().map(|dir| search.join(dir)));
    for agent in registry.all() {
        let dir = search.join(&agent.skills_dir);
        if !priority.contains(&dir) {
            priority.push(dir);
        }
    }

    for dir in &priority {
        for child in child_dirs(dir) {
            if let Some(skill) = parse_skill_manifest(&child) {
                found.push(skill);
            }
        }
    }

    if found.skills.is_empty() {
        let walker = WalkDir::new(search)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !is_skipped_dir(&entry.file_name().to_string_lossy())
            });
        for entry in walker.filter_map(|entry| entry.ok()) {
            if entry.file_type().is_dir() {
                if let Some(skill) = parse_skill_manifest(entry.path()) {
                    found.push(skill);
                }
            }
        }
    }

    found.skills
}
