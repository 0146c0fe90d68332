use std::env;
use std::process::Command;

/// Stamp `FLINS_VERSION`: the crate version, plus `-dev+<hash>[.dirty]` for debug builds.
fn main() {
    let version = env::var("CARGO_PKG_VERSION").unwrap();
    let profile = env::var("PROFILE").unwrap_or_default();

    let full_version = if profile == "debug" {
        match git_output(&["rev-parse", "--short=8", "HEAD"]) {
            Some(hash) if worktree_is_dirty() => format!("{}-dev+{}.dirty", version, hash),
            Some(hash) => format!("{}-dev+{}", version, hash),
            None => format!("{}-dev", version),
        }
    } else {
        version
    };

    println!("cargo:rustc-env=FLINS_VERSION={}", full_version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|out| !out.is_empty())
}

fn worktree_is_dirty() -> bool {
    // Exit status 1 from `git diff --quiet` means there are changes
    let changed = |args: &[&str]| {
        Command::new("git")
            .args(args)
            .status()
            .map(|status| status.code() == Some(1))
            .unwrap_or(false)
    };
    changed(&["diff", "--quiet"]) || changed(&["diff", "--cached", "--quiet"])
}
