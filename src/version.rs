use semver::Version;

// Compile-time constants from Cargo.toml and build.rs
pub const VERSION: &str = env!("FLINS_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

// GitHub repository queried by the update notifier
pub const REPO_OWNER: &str = "flins-dev";
pub const REPO_NAME: &str = "flins";

/// Check if another version is newer than the running binary.
///
/// Build metadata (`-dev+hash`) is ignored so that a dev build of 0.4.0
/// does not report 0.4.0 as an upgrade.
pub fn is_newer_version(other: &str) -> bool {
    let other = other.trim_start_matches('v');
    match (Version::parse(base_version(VERSION)), Version::parse(other)) {
        (Ok(current), Ok(latest)) => latest > current,
        _ => false,
    }
}

fn base_version(version: &str) -> &str {
    version.split(['-', '+']).next().unwrap_or(version)
}
