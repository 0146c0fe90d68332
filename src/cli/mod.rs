use clap::{Parser, Subcommand};

pub mod flags;
pub use flags::{ConfirmFlags, InstallFlags};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration files
    Validate,

    /// Show effective configuration after merging all sources
    Show,
}

#[derive(Parser, Debug)]
#[command(name = "flins")]
#[command(
    about = "Install skills and commands for AI coding agents from git repositories",
    long_about = None
)]
#[command(version = env!("FLINS_VERSION"))]
#[command(after_help = "\
SOURCES:
  owner/repo                                  GitHub shorthand
  https://github.com/owner/repo/tree/dev/dir  Branch and subdirectory
  https://gitlab.com/group/repo               GitLab
  git@host:owner/repo.git                     Any git URL

EXAMPLES:
  flins add acme/skills                       Pick skills interactively
  flins add acme/skills -s review -a cursor   Install one skill for Cursor
  flins add acme/skills -g -y                 Everything, globally, no prompts
  flins outdated                              Check tracked items for updates")]
pub struct Cli {
    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install skills and commands from a git repository
    #[command(visible_alias = "a", alias = "install", alias = "i")]
    Add {
        /// Repository: owner/repo, a GitHub or GitLab URL, or any git URL
        source: String,

        #[command(flatten)]
        flags: InstallFlags,
    },

    /// Update tracked skills and commands to their latest commit
    #[command(visible_alias = "u")]
    Update {
        /// Names to update (default: all)
        names: Vec<String>,

        #[command(flatten)]
        confirm: ConfirmFlags,
    },

    /// Show which tracked skills and commands have updates
    #[command(visible_alias = "status", alias = "o")]
    Outdated {
        /// Names to check (default: all)
        names: Vec<String>,

        /// Show sources, commits and installation paths
        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Remove installed skills and commands
    #[command(visible_alias = "rm", alias = "r", alias = "uninstall")]
    Remove {
        /// Names to remove (default: choose interactively)
        names: Vec<String>,

        #[command(flatten)]
        confirm: ConfirmFlags,
    },

    /// List tracked skills and commands
    #[command(visible_alias = "ls", alias = "l")]
    List,

    /// Search the skill directory
    #[command(visible_alias = "s")]
    Search {
        /// Text to match against names and descriptions
        query: Option<String>,
    },

    /// Stop tracking entries whose installations are gone
    #[command(visible_alias = "c")]
    Clean {
        #[command(flatten)]
        confirm: ConfirmFlags,
    },

    /// List supported agents and which ones are installed
    Agents {
        /// Include agents that are not detected
        #[arg(long)]
        all: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_flags() {
        let cli = Cli::parse_from([
            "flins", "add", "acme/skills", "-g", "-a", "cursor", "codex", "-s", "review", "-f",
            "--no-symlink",
        ]);
        match cli.command {
            Commands::Add { source, flags } => {
                assert_eq!(source, "acme/skills");
                assert!(flags.global);
                assert_eq!(flags.agents, vec!["cursor", "codex"]);
                assert_eq!(flags.units, vec!["review"]);
                assert!(flags.confirm.assume_yes());
                assert!(flags.no_symlink);
                assert!(!flags.list);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_aliases() {
        assert!(matches!(
            Cli::parse_from(["flins", "i", "acme/skills"]).command,
            Commands::Add { .. }
        ));
        assert!(matches!(
            Cli::parse_from(["flins", "status", "-v"]).command,
            Commands::Outdated { verbose: true, .. }
        ));
        assert!(matches!(
            Cli::parse_from(["flins", "uninstall", "review"]).command,
            Commands::Remove { .. }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["flins", "list", "--silent", "--debug"]);
        assert!(cli.silent);
        assert!(cli.debug);
    }
}
