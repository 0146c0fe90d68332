use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlinsError {
    #[error("Git is not installed. Install it from https://git-scm.com/downloads")]
    GitNotInstalled,

    #[error("Git error: {0}")]
    Git(String),

    #[error("Failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error(
        "No skills or commands found in {origin}.\n\
         A skill is a directory containing a SKILL.md with `name` and `description` frontmatter.\n\
         A command is a markdown file inside a `commands/` directory."
    )]
    NoUnitsFound { origin: String },

    #[error("No matching skills or commands found for: {requested}\nAvailable: {available}")]
    NoMatchingUnits {
        requested: String,
        available: String,
    },

    #[error("{kind} '{name}' no longer exists in the repository")]
    UnitNotInRepository { kind: String, name: String },

    #[error("Invalid agents: {invalid}\nValid agents: {valid}")]
    UnknownAgents { invalid: String, valid: String },

    #[error("None of the selected agents support commands. Agents with command support: {0}")]
    NoCommandAgents(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not determine the home directory")]
    HomeNotFound,

    #[error("State file error: {0}")]
    State(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<dialoguer::Error> for FlinsError {
    fn from(err: dialoguer::Error) -> Self {
        FlinsError::Prompt(err.to_string())
    }
}

impl From<reqwest::Error> for FlinsError {
    fn from(err: reqwest::Error) -> Self {
        FlinsError::NetworkError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlinsError>;
