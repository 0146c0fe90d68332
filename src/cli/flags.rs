use clap::Parser;

/// Confirmation flags shared by every command that can prompt.
#[derive(Parser, Debug, Clone, Default)]
pub struct ConfirmFlags {
    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Same as --yes
    #[arg(short = 'f', long)]
    pub force: bool,
}

impl ConfirmFlags {
    pub fn assume_yes(&self) -> bool {
        self.yes || self.force
    }
}

/// Flags for `flins add`.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallFlags {
    /// Install to the global scope (~/...) instead of the current project
    #[arg(short = 'g', long)]
    pub global: bool,

    /// Target agents (e.g. claude-code cursor). Defaults to detected agents
    #[arg(short = 'a', long = "agent", num_args = 1..)]
    pub agents: Vec<String>,

    /// Skill or command names to install. Defaults to an interactive choice
    #[arg(short = 's', long = "skill", num_args = 1..)]
    pub units: Vec<String>,

    /// List available skills and commands without installing
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Copy files into each agent directory instead of symlinking
    #[arg(long = "no-symlink")]
    pub no_symlink: bool,

    #[command(flatten)]
    pub confirm: ConfirmFlags,
}
