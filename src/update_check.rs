//! Background notice when a newer flins release is published.

use crate::config::UpdateCheckConfig;
use crate::version::{is_newer_version, REPO_NAME, REPO_OWNER, VERSION};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const CACHE_FILE: &str = "update-check.json";

/// Cache structure for storing update check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheckCache {
    pub last_check: u64,
    pub latest_version: Option<String>,
    pub update_available: bool,
}

impl UpdateCheckCache {
    /// Check if the cache is stale based on the interval.
    /// Uses saturating_sub to handle clock skew gracefully
    pub fn is_stale(&self, interval_hours: u64) -> bool {
        let elapsed_hours = now().saturating_sub(self.last_check) / 3600;
        elapsed_hours >= interval_hours
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn cache_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CACHE_FILE)
}

fn load_cache(path: &Path) -> Option<UpdateCheckCache> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Save the cache to disk with restricted permissions (0600)
fn save_cache(path: &Path, cache: &UpdateCheckCache) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    if let Ok(content) = serde_json::to_string_pretty(cache) {
        if fs::write(path, content).is_ok() {
            #[cfg(unix)]
            {
                let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
            }
        }
    }
}

/// Latest published release, without the `v` prefix.
fn get_latest_version() -> Option<String> {
    let releases = self_update::backends::github::ReleaseList::configure()
        .repo_owner(REPO_OWNER)
        .repo_name(REPO_NAME)
        .build()
        .ok()?
        .fetch()
        .ok()?;
    releases
        .first()
        .map(|release| release.version.trim_start_matches('v').to_string())
}

/// Query GitHub and build a fresh cache entry
fn perform_version_check() -> UpdateCheckCache {
    // Only cache strings that parse as semver
    let latest_version = get_latest_version().filter(|v| Version::parse(v).is_ok());
    tracing::debug!(latest = ?latest_version, "checked latest release");

    let update_available = latest_version
        .as_deref()
        .map(is_newer_version)
        .unwrap_or(false);

    UpdateCheckCache {
        last_check: now(),
        latest_version,
        update_available,
    }
}

/// CI environments don't need update notifications as users can't act on them
fn is_ci_environment() -> bool {
    [
        "CI",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "CIRCLECI",
        "TRAVIS",
        "JENKINS_HOME",
        "TEAMCITY_VERSION",
        "BUILDKITE",
    ]
    .iter()
    .any(|var| std::env::var_os(var).is_some())
}

/// Only allows characters valid in semver: 0-9, a-z, A-Z, ., -, +
fn sanitize_version(version: &str) -> String {
    version
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '+')
        .collect()
}

fn render_notification(latest_version: &str) -> Vec<String> {
    let safe_version = sanitize_version(latest_version);

    let width = 47;
    let rule = "─".repeat(width - 2);
    let title = "A new version of flins is available!";
    let download = format!("github.com/{}/{}/releases", REPO_OWNER, REPO_NAME);

    vec![
        format!("╭{}╮", rule),
        format!("│{:^width$}│", title, width = width - 2),
        format!("├{}┤", rule),
        format!("│  Current: {:<width$}│", VERSION, width = width - 13),
        format!("│  Latest:  {:<width$}│", safe_version, width = width - 13),
        format!("├{}┤", rule),
        format!("│  {:<width$}│", download, width = width - 4),
        format!("╰{}╯", rule),
    ]
}

/// Print a boxed notice if a newer release exists.
///
/// Never fails: network and cache errors are ignored. Runs blocking I/O, so
/// async callers should go through `spawn_blocking`.
pub fn check_and_notify(config: &UpdateCheckConfig, state_dir: &Path) {
    if !config.enabled || is_ci_environment() || !std::io::stderr().is_terminal() {
        return;
    }

    let path = cache_path(state_dir);
    let cache = match load_cache(&path) {
        Some(cache) if !cache.is_stale(config.interval_hours) => cache,
        _ => {
            let fresh = perform_version_check();
            save_cache(&path, &fresh);
            fresh
        }
    };

    if !cache.update_available {
        return;
    }
    if let Some(version) = cache.latest_version.as_deref() {
        eprintln!();
        for line in render_notification(version) {
            eprintln!("{}", line);
        }
        eprintln!();
    }
}
