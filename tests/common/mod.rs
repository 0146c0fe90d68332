//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use flins::agents::AgentRegistry;
use flins::config::Config;
use flins::context::{Context, Roots};
use flins::error::{FlinsError, Result};
use flins::fetcher::{Checkout, RepositoryFetcher};
use flins::prompt::{Choice, Prompter};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Isolated home and project directories.
pub struct Sandbox {
    pub home: TempDir,
    pub cwd: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            cwd: TempDir::new().unwrap(),
        }
    }

    pub fn roots(&self) -> Roots {
        Roots::new(self.cwd.path(), self.home.path())
    }

    pub fn context(&self) -> Context {
        Context::new(
            self.roots(),
            Config::default(),
            AgentRegistry::load().unwrap(),
            true,
        )
    }

    pub fn project(&self, rel: &str) -> PathBuf {
        self.cwd.path().join(rel)
    }

    pub fn global(&self, rel: &str) -> PathBuf {
        self.home.path().join(rel)
    }

    /// Make an agent look installed.
    pub fn detect(&self, config_dir: &str) {
        fs::create_dir_all(self.home.path().join(config_dir)).unwrap();
    }
}

pub fn write_skill(repo: &Path, dir: &str, name: &str, description: &str) {
    let path = repo.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(
        path.join("SKILL.md"),
        format!("---\nname: {}\ndescription: {}\n---\n\n# {}\n", name, description, name),
    )
    .unwrap();
}

pub fn write_command(repo: &Path, dir: &str, file: &str, description: &str) {
    let path = repo.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(
        path.join(file),
        format!("---\ndescription: {}\n---\n\nDo the thing.\n", description),
    )
    .unwrap();
}

struct FakeRepo {
    path: PathBuf,
    commit: String,
    latest: std::result::Result<String, String>,
}

/// [`RepositoryFetcher`] serving local directories instead of remotes.
#[derive(Default)]
pub struct FakeFetcher {
    repos: Mutex<HashMap<String, FakeRepo>>,
    branches: Mutex<HashMap<String, String>>,
    pub remote_queries: Mutex<Vec<String>>,
    pub clones: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `path` for `url`, checked out at `commit` which is also the remote tip.
    pub fn serve(&self, url: &str, path: &Path, commit: &str) {
        self.repos.lock().unwrap().insert(
            url.to_string(),
            FakeRepo {
                path: path.to_path_buf(),
                commit: commit.to_string(),
                latest: Ok(commit.to_string()),
            },
        );
    }

    /// Move the remote tip (and the next clone) to `commit`.
    pub fn publish(&self, url: &str, commit: &str) {
        if let Some(repo) = self.repos.lock().unwrap().get_mut(url) {
            repo.commit = commit.to_string();
            repo.latest = Ok(commit.to_string());
        }
    }

    /// Make remote lookups for `url` fail.
    pub fn break_remote(&self, url: &str) {
        if let Some(repo) = self.repos.lock().unwrap().get_mut(url) {
            repo.latest = Err("connection refused".to_string());
        }
    }

    pub fn set_default_branch(&self, path: &Path, branch: &str) {
        self.branches
            .lock()
            .unwrap()
            .insert(path.display().to_string(), branch.to_string());
    }
}

#[async_trait]
impl RepositoryFetcher for FakeFetcher {
    async fn clone_repo(&self, url: &str, branch: Option<&str>) -> Result<Checkout> {
        self.clones
            .lock()
            .unwrap()
            .push((url.to_string(), branch.map(str::to_string)));
        let repos = self.repos.lock().unwrap();
        let repo = repos.get(url).ok_or_else(|| FlinsError::CloneFailed {
            url: url.to_string(),
            message: "repository not found".to_string(),
        })?;
        Ok(Checkout::existing(&repo.path))
    }

    async fn latest_commit(&self, url: &str, _branch: &str) -> Result<String> {
        self.remote_queries.lock().unwrap().push(url.to_string());
        let repos = self.repos.lock().unwrap();
        match repos.get(url).map(|repo| repo.latest.clone()) {
            Some(Ok(commit)) => Ok(commit),
            Some(Err(message)) => Err(FlinsError::Git(message)),
            None => Err(FlinsError::Git("repository not found".to_string())),
        }
    }

    async fn commit_hash(&self, path: &Path) -> Result<String> {
        let repos = self.repos.lock().unwrap();
        repos
            .values()
            .find(|repo| repo.path == path)
            .map(|repo| repo.commit.clone())
            .ok_or_else(|| FlinsError::Git("not a repository".to_string()))
    }

    async fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        Ok(self
            .branches
            .lock()
            .unwrap()
            .get(&path.display().to_string())
            .cloned())
    }
}

/// One scripted answer to a prompt.
#[derive(Debug, Clone)]
pub enum Answer {
    Pick(Vec<usize>),
    Choose(usize),
    Confirm(bool),
    /// The user pressed Esc.
    Cancel,
}

/// [`Prompter`] replaying a fixed script. Running out of answers cancels.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    fn next(&self, message: &str) -> Option<Answer> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers.lock().unwrap().pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn multi_select(
        &self,
        message: &str,
        _choices: &[Choice],
        _defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        match self.next(message) {
            Some(Answer::Pick(indices)) => Ok(Some(indices)),
            Some(Answer::Cancel) | None => Ok(None),
            Some(other) => panic!("expected a multi-select answer for '{message}', got {other:?}"),
        }
    }

    fn select(&self, message: &str, _choices: &[Choice]) -> Result<Option<usize>> {
        match self.next(message) {
            Some(Answer::Choose(index)) => Ok(Some(index)),
            Some(Answer::Cancel) | None => Ok(None),
            Some(other) => panic!("expected a select answer for '{message}', got {other:?}"),
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> Result<Option<bool>> {
        match self.next(message) {
            Some(Answer::Confirm(value)) => Ok(Some(value)),
            Some(Answer::Cancel) | None => Ok(None),
            Some(other) => panic!("expected a confirmation for '{message}', got {other:?}"),
        }
    }
}
