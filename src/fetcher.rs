//! Fetching skill repositories with the system `git`.

use crate::error::{FlinsError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

/// A local working copy of a fetched repository.
///
/// Temporary checkouts are deleted by [`Checkout::cleanup`], or on drop if
/// the caller bails out early.
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl Checkout {
    pub fn temporary(dir: TempDir) -> Self {
        Self {
            path: dir.path().to_path_buf(),
            temp: Some(dir),
        }
    }

    /// A checkout that is not ours to delete.
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cleanup(mut self) {
        if let Some(dir) = self.temp.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove checkout");
            }
        }
    }
}

/// Access to remote repositories.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Shallow-clone `url`, on `branch` when given.
    async fn clone_repo(&self, url: &str, branch: Option<&str>) -> Result<Checkout>;

    /// Commit at the tip of `branch` on the remote, without cloning.
    async fn latest_commit(&self, url: &str, branch: &str) -> Result<String>;

    /// Commit checked out in a working copy.
    async fn commit_hash(&self, path: &Path) -> Result<String>;

    /// Branch checked out in a working copy, `None` when detached.
    async fn current_branch(&self, path: &Path) -> Result<Option<String>>;
}

/// [`RepositoryFetcher`] backed by the `git` executable.
#[derive(Debug, Default, Clone)]
pub struct GitFetcher;

impl GitFetcher {
    pub fn new() -> Result<Self> {
        which::which("git").map_err(|_| FlinsError::GitNotInstalled)?;
        Ok(Self)
    }
}

async fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut command = Command::new("git");
    command.args(args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    tracing::debug!(?args, "running git");

    let output = command
        .output()
        .await
        .map_err(|e| FlinsError::Git(format!("Failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(FlinsError::Git(if stderr.is_empty() {
            format!("git {} exited with {}", args.join(" "), output.status)
        } else {
            stderr
        }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn clone_repo(&self, url: &str, branch: Option<&str>) -> Result<Checkout> {
        let dir = tempfile::Builder::new().prefix("flins-").tempdir()?;
        let target = dir.path().to_string_lossy().into_owned();

        let mut args = vec!["clone", "--depth", "1"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend(["--", url, target.as_str()]);

        run_git(&args, None)
            .await
            .map_err(|e| FlinsError::CloneFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Checkout::temporary(dir))
    }

    async fn latest_commit(&self, url: &str, branch: &str) -> Result<String> {
        let reference = format!("refs/heads/{}", branch);
        let output = run_git(&["ls-remote", url, &reference], None).await?;
        output
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| FlinsError::Git(format!("Branch '{}' not found on {}", branch, url)))
    }

    async fn commit_hash(&self, path: &Path) -> Result<String> {
        run_git(&["rev-parse", "HEAD"], Some(path)).await
    }

    async fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        let branch = run_git(&["rev-parse", "--abbrev-ref", "HEAD"], Some(path)).await?;
        Ok(Some(branch).filter(|b| !b.is_empty() && b != "HEAD"))
    }
}
