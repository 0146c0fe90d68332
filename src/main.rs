#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use flins::agents::AgentRegistry;
use flins::cli::{Cli, Commands, InstallFlags};
use flins::commands::{self, Outcome};
use flins::config::Config;
use flins::context::{Context, Roots};
use flins::fetcher::GitFetcher;
use flins::prompt::TerminalPrompter;

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("flins=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn install_options(flags: &InstallFlags, config: &Config) -> commands::install::InstallOptions {
    commands::install::InstallOptions {
        global: flags.global.then_some(true),
        agents: flags.agents.clone(),
        units: flags.units.clone(),
        list: flags.list,
        yes: flags.confirm.assume_yes(),
        symlink: config.install.symlink && !flags.no_symlink,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let roots = Roots::detect()?;

    // Config commands must work even when the config files are broken
    if let Commands::Config { command } = &cli.command {
        commands::config::execute(command, &roots)?;
        return Ok(());
    }

    let config = Config::load(&roots)?;
    let registry = AgentRegistry::load()?;
    let ctx = Context::new(roots, config, registry, cli.silent);

    let success = run(&ctx, &cli.command).await?;

    if !ctx.silent {
        let update_config = ctx.config.update_check.clone();
        let state_dir = ctx.roots.state_dir();
        let check = tokio::task::spawn_blocking(move || {
            flins::update_check::check_and_notify(&update_config, &state_dir)
        });
        if let Err(e) = check.await {
            tracing::debug!(error = %e, "update check did not complete");
        }
    }

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Dispatch one command. `Ok(false)` means it ran but something requested failed.
async fn run(ctx: &Context, command: &Commands) -> Result<bool> {
    let prompter = TerminalPrompter::default();

    let success = match command {
        Commands::Add { source, flags } => {
            let fetcher = GitFetcher::new()?;
            let options = install_options(flags, &ctx.config);
            match commands::install::execute(ctx, &fetcher, &prompter, source, &options).await? {
                Outcome::Completed(report) => report.is_success(),
                Outcome::Cancelled => true,
            }
        }
        Commands::Update { names, confirm } => {
            let fetcher = GitFetcher::new()?;
            let options = commands::update::UpdateOptions {
                yes: confirm.assume_yes(),
            };
            match commands::update::execute(ctx, &fetcher, &prompter, names, &options).await? {
                Outcome::Completed(report) => !report.has_failures(),
                Outcome::Cancelled => true,
            }
        }
        Commands::Outdated { names, verbose } => {
            let fetcher = GitFetcher::new()?;
            commands::outdated::execute(ctx, &fetcher, names, *verbose).await?;
            true
        }
        Commands::Remove { names, confirm } => {
            let options = commands::remove::RemoveOptions {
                yes: confirm.assume_yes(),
            };
            match commands::remove::execute(ctx, &prompter, names, &options).await? {
                Outcome::Completed(report) => !report.has_failures(),
                Outcome::Cancelled => true,
            }
        }
        Commands::List => {
            commands::list::execute(ctx)?;
            true
        }
        Commands::Search { query } => {
            let interactive = query.is_none() && std::io::stdin().is_terminal();
            let chosen =
                commands::search::execute(ctx, &prompter, query.as_deref(), interactive).await?;
            match chosen {
                Outcome::Completed(Some(source)) => {
                    let fetcher = GitFetcher::new()?;
                    let options = install_options(&InstallFlags::default(), &ctx.config);
                    match commands::install::execute(ctx, &fetcher, &prompter, &source, &options)
                        .await?
                    {
                        Outcome::Completed(report) => report.is_success(),
                        Outcome::Cancelled => true,
                    }
                }
                Outcome::Completed(None) | Outcome::Cancelled => true,
            }
        }
        Commands::Clean { .. } => {
            commands::clean::execute(ctx)?;
            true
        }
        Commands::Agents { all } => {
            commands::agents::execute(ctx, *all).await?;
            true
        }
        Commands::Config { command } => {
            commands::config::execute(command, &ctx.roots)?;
            true
        }
    };

    Ok(success)
}
