use super::frontmatter::parse_frontmatter;
use super::{is_skipped_dir, MAX_DEPTH};
use crate::unit::{is_safe_name, Command};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const COMMANDS_DIR: &str = "commands";

const SKIP_FILES: &[&str] = &["README.md", "readme.md", ".DS_Store"];

/// Every directory named `commands` below `search`, without descending into them.
fn find_commands_dirs(search: &Path) -> Vec<PathBuf> {
    if search.file_name().is_some_and(|name| name == COMMANDS_DIR) && search.is_dir() {
        return vec![search.to_path_buf()];
    }

    let mut dirs = Vec::new();
    let mut walker = WalkDir::new(search)
        .min_depth(1)
        .max_depth(MAX_DEPTH + 1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_skipped_dir(&name) {
            walker.skip_current_dir();
        } else if name == COMMANDS_DIR {
            dirs.push(entry.into_path());
            walker.skip_current_dir();
        }
    }

    dirs
}

fn parse_command(path: &Path) -> Option<Command> {
    let content = fs::read_to_string(path).ok()?;
    let frontmatter = parse_frontmatter(&content);
    let name = match frontmatter.get("name") {
        Some(name) => name.to_string(),
        None => path.file_stem()?.to_string_lossy().into_owned(),
    };
    if !is_safe_name(&name) {
        tracing::warn!(path = %path.display(), %name, "skipping command with an unusable name");
        return None;
    }
    Some(Command {
        name,
        description: frontmatter.get("description").map(str::to_string),
        path: path.to_path_buf(),
    })
}

fn read_commands(dir: &Path) -> Vec<Command> {
    let Ok(reader) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = reader
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !SKIP_FILES.contains(&name.as_ref())
        })
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("md"))
        })
        .collect();
    files.sort();

    files.iter().filter_map(|path| parse_command(path)).collect()
}

/// Discover markdown commands in every `commands/` directory below `search`.
pub fn discover_commands(search: &Path) -> Vec<Command> {
    let mut seen = HashSet::new();
    let mut commands = Vec::new();

    for dir in find_commands_dirs(search) {
        for command in read_commands(&dir) {
            if seen.insert(command.name.to_lowercase()) {
                commands.push(command);
            }
        }
    }

    commands
}
