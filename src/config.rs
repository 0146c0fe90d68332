use crate::context::Roots;
use crate::error::{FlinsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const GLOBAL_CONFIG_FILE: &str = "config.toml";
pub const PROJECT_CONFIG_FILE: &str = ".flins.toml";
pub const DEFAULT_DIRECTORY_URL: &str = "https://flins.tech/directory.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub update_check: UpdateCheckConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    /// Link agent directories to a shared copy instead of copying into each
    #[serde(default = "default_true")]
    pub symlink: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            symlink: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for UpdateCheckConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_hours: default_interval_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            directory_url: default_directory_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_hours() -> u64 {
    24
}

fn default_directory_url() -> String {
    DEFAULT_DIRECTORY_URL.to_string()
}

impl Config {
    /// Load configuration with precedence:
    /// 1. CLI flags (applied by the individual commands)
    /// 2. Environment variables
    /// 3. Project config (.flins.toml in the working directory)
    /// 4. Global config (~/.flins/config.toml)
    /// 5. Built-in defaults
    pub fn load(roots: &Roots) -> Result<Self> {
        let config = Self::from_layers(&[
            Self::global_path(&roots.home),
            Self::project_path(&roots.cwd),
        ])?;
        let config = config.merge_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn global_path(home: &Path) -> PathBuf {
        home.join(".flins").join(GLOBAL_CONFIG_FILE)
    }

    pub fn project_path(cwd: &Path) -> PathBuf {
        cwd.join(PROJECT_CONFIG_FILE)
    }

    /// Merge the given files in order (later files win), skipping missing ones.
    ///
    /// Tables are merged key by key, so a project file setting only
    /// `[install] symlink` keeps the global `[update_check]` section.
    pub fn from_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            let contents = std::fs::read_to_string(path)?;
            let layer: toml::Table = toml::from_str(&contents)?;
            tracing::debug!(path = %path.display(), "loaded config layer");
            merge_tables(&mut merged, layer);
        }
        let config: Config = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn merge_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FLINS_DIRECTORY_URL").filter(|url| !url.is_empty()) {
            self.search.directory_url = url;
        }
        if lookup("NO_UPDATE_NOTIFIER").is_some() {
            self.update_check.enabled = false;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_check.interval_hours == 0 {
            return Err(FlinsError::InvalidConfig(
                "update_check.interval_hours must be greater than 0".to_string(),
            ));
        }
        let url = &self.search.directory_url;
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(FlinsError::InvalidConfig(format!(
                "search.directory_url must be an http(s) URL, got '{}'",
                url
            )));
        }
        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
