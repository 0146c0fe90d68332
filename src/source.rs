//! Turn a user-supplied source string into a clonable descriptor.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const DEFAULT_BRANCH: &str = "main";

static GITHUB_TREE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)/tree/([^/]+)(?:/(.+))?").expect("valid regex")
});
static GITHUB_REPO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"github\.com/([^/]+)/([^/]+)").expect("valid regex"));
static GITLAB_TREE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"gitlab\.com/([^/]+)/([^/]+)/-/tree/([^/]+)(?:/(.+))?").expect("valid regex")
});
static GITLAB_REPO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gitlab\.com/([^/]+)/([^/]+)").expect("valid regex"));
static SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]+)/([^/]+)(?:/(.+))?$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    GitHub,
    GitLab,
    Git,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::GitHub => "github",
            SourceKind::GitLab => "gitlab",
            SourceKind::Git => "git",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    pub url: String,
    /// Branch named in the source; `None` means the remote default.
    pub branch: Option<String>,
    pub subpath: Option<String>,
}

impl SourceDescriptor {
    fn new(kind: SourceKind, url: String) -> Self {
        Self {
            kind,
            url,
            branch: None,
            subpath: None,
        }
    }

    fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch.map(str::to_string);
        self
    }

    fn with_subpath(mut self, subpath: Option<&str>) -> Self {
        self.subpath = subpath
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn branch_or_default(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }
}

fn clean_repo(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

/// Parse a source string. Rules are tried in order and the first match wins:
///
/// 1. `github.com/<owner>/<repo>/tree/<branch>[/<subpath>]`
/// 2. `github.com/<owner>/<repo>`
/// 3. `gitlab.com/<owner>/<repo>/-/tree/<branch>[/<subpath>]`
/// 4. `gitlab.com/<owner>/<repo>`
/// 5. `<owner>/<repo>[/<subpath>]` shorthand for GitHub, unless the input has a `:`
/// 6. anything else is used verbatim as a git URL
pub fn parse_source(input: &str) -> SourceDescriptor {
    let input = input.trim();

    if let Some(caps) = GITHUB_TREE.captures(input) {
        return SourceDescriptor::new(
            SourceKind::GitHub,
            format!("https://github.com/{}/{}.git", &caps[1], clean_repo(&caps[2])),
        )
        .with_branch(Some(&caps[3]))
        .with_subpath(caps.get(4).map(|m| m.as_str()));
    }

    if let Some(caps) = GITHUB_REPO.captures(input) {
        return SourceDescriptor::new(
            SourceKind::GitHub,
            format!("https://github.com/{}/{}.git", &caps[1], clean_repo(&caps[2])),
        );
    }

    if let Some(caps) = GITLAB_TREE.captures(input) {
        return SourceDescriptor::new(
            SourceKind::GitLab,
            format!("https://gitlab.com/{}/{}.git", &caps[1], clean_repo(&caps[2])),
        )
        .with_branch(Some(&caps[3]))
        .with_subpath(caps.get(4).map(|m| m.as_str()));
    }

    if let Some(caps) = GITLAB_REPO.captures(input) {
        return SourceDescriptor::new(
            SourceKind::GitLab,
            format!("https://gitlab.com/{}/{}.git", &caps[1], clean_repo(&caps[2])),
        );
    }

    if !input.contains(':') {
        if let Some(caps) = SHORTHAND.captures(input) {
            return SourceDescriptor::new(
                SourceKind::GitHub,
                format!("https://github.com/{}/{}.git", &caps[1], clean_repo(&caps[2])),
            )
            .with_subpath(caps.get(3).map(|m| m.as_str()));
        }
    }

    SourceDescriptor::new(SourceKind::Git, input.to_string())
}
