//! `flins add`: fetch a source and install its skills and commands.

use super::Outcome;
use crate::agents::AgentDescriptor;
use crate::context::Context;
use crate::discovery::{discover, Discovered};
use crate::error::{FlinsError, Result};
use crate::fetcher::RepositoryFetcher;
use crate::installer::{InstallMode, InstallOutcome, Installer, Payload};
use crate::prompt::{Choice, Prompter};
use crate::source::{parse_source, SourceDescriptor, DEFAULT_BRANCH};
use crate::state::{Scope, StateEntry, UnitKey};
use crate::ui::Ui;
use crate::unit::{Command, Skill, Unit, UnitKind};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// `Some(true)` for `--global`; `None` asks (or defaults to project with `--yes`).
    pub global: Option<bool>,
    pub agents: Vec<String>,
    /// Skill or command names to install instead of choosing interactively.
    pub units: Vec<String>,
    pub list: bool,
    pub yes: bool,
    pub symlink: bool,
}

/// Outcome of installing one unit for one agent.
#[derive(Debug, Clone)]
pub struct PairResult {
    pub unit: String,
    pub kind: UnitKind,
    pub agent: String,
    pub outcome: InstallOutcome,
}

/// A re-add that moved a tracked unit to a different branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchChange {
    pub unit: String,
    pub kind: UnitKind,
    pub previous: String,
    pub current: String,
}

/// A unit that was installed but could not be written to the lockfile.
#[derive(Debug, Clone)]
pub struct TrackingFailure {
    pub unit: String,
    pub kind: UnitKind,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    pub scope: Option<Scope>,
    pub results: Vec<PairResult>,
    pub branch_changes: Vec<BranchChange>,
    pub untracked: Vec<TrackingFailure>,
}

impl InstallReport {
    pub fn installed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.outcome.success).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.untracked.is_empty()
    }
}

/// One (unit, agent) installation to perform.
struct Pair {
    unit: usize,
    agent: Arc<AgentDescriptor>,
    target: PathBuf,
}

pub async fn execute(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    prompter: &dyn Prompter,
    source: &str,
    options: &InstallOptions,
) -> Result<Outcome<InstallReport>> {
    let ui = ctx.ui();

    // Reject unknown agents before any network access.
    if !options.agents.is_empty() {
        ctx.registry.resolve_ids(&options.agents)?;
    }

    let descriptor = parse_source(source);
    ui.line(format!("Source: {}", descriptor.url));
    if let Some(branch) = &descriptor.branch {
        ui.line(format!("Branch: {}", branch));
    }
    if let Some(subpath) = &descriptor.subpath {
        ui.line(format!("Path: {}", subpath));
    }

    let spinner = ui.spinner("Cloning repository...");
    let checkout = match fetcher
        .clone_repo(&descriptor.url, descriptor.branch.as_deref())
        .await
    {
        Ok(checkout) => {
            spinner.finish("Repository cloned");
            checkout
        }
        Err(e) => {
            spinner.fail("Failed to clone repository");
            return Err(e);
        }
    };

    let result = install_from_checkout(
        ctx,
        fetcher,
        prompter,
        &ui,
        &descriptor,
        checkout.path(),
        source,
        options,
    )
    .await;
    checkout.cleanup();
    result
}

#[allow(clippy::too_many_arguments)]
async fn install_from_checkout(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    prompter: &dyn Prompter,
    ui: &Ui,
    descriptor: &SourceDescriptor,
    checkout: &std::path::Path,
    source: &str,
    options: &InstallOptions,
) -> Result<Outcome<InstallReport>> {
    let commit = fetcher.commit_hash(checkout).await?;
    let branch = match &descriptor.branch {
        Some(branch) => branch.clone(),
        None => match fetcher.current_branch(checkout).await {
            Ok(Some(branch)) => branch,
            Ok(None) => DEFAULT_BRANCH.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "could not read checked out branch");
                DEFAULT_BRANCH.to_string()
            }
        },
    };

    let discovered = discover(checkout, descriptor.subpath.as_deref(), &ctx.registry);
    if discovered.is_empty() {
        return Err(FlinsError::NoUnitsFound {
            origin: source.to_string(),
        });
    }
    ui.success(format!(
        "Found {} skill(s) and {} command(s)",
        discovered.skills.len(),
        discovered.commands.len()
    ));

    if options.list {
        print_available(ui, &discovered);
        return Ok(Outcome::Completed(InstallReport::default()));
    }

    let (skills, commands) = or_cancel!(select_units(&discovered, options, prompter, ui)?);
    if skills.is_empty() && commands.is_empty() {
        ui.line("Nothing selected.");
        return Ok(Outcome::Cancelled);
    }

    let skill_agents = if skills.is_empty() {
        Vec::new()
    } else {
        or_cancel!(select_skill_agents(ctx, options, prompter, ui).await?)
    };
    let command_agents = if commands.is_empty() {
        Vec::new()
    } else {
        ui.warn("Command support is experimental.");
        or_cancel!(select_command_agents(ctx, options, prompter, ui).await?)
    };

    let scope = or_cancel!(select_scope(options, prompter)?);

    let units: Vec<Unit> = skills
        .into_iter()
        .map(Unit::Skill)
        .chain(commands.into_iter().map(Unit::Command))
        .collect();
    let pairs = plan_pairs(ctx, scope, &units, &skill_agents, &command_agents);
    if pairs.is_empty() {
        ui.line("Nothing to install.");
        return Ok(Outcome::Cancelled);
    }

    print_summary(ctx, ui, scope, &units, &pairs);
    if !options.yes {
        let proceed = or_cancel!(prompter.confirm("Proceed with installation?", true)?);
        if !proceed {
            ui.line("Installation cancelled.");
            return Ok(Outcome::Cancelled);
        }
    }

    let installer = Installer::new(
        InstallMode::from_symlink_flag(options.symlink),
        ctx.payload_store(scope),
    );

    let spinner = ui.spinner("Installing...");
    let payloads: Vec<Payload> = join_all(units.iter().map(|unit| installer.prepare(unit))).await;

    let installs = pairs.iter().map(|pair| {
        let unit = &units[pair.unit];
        let payload = &payloads[pair.unit];
        let installer = &installer;
        async move {
            PairResult {
                unit: unit.name().to_string(),
                kind: unit.kind(),
                agent: pair.agent.id.clone(),
                outcome: installer.install(unit.kind(), payload, &pair.target).await,
            }
        }
    });
    let results = join_all(installs).await;
    spinner.clear();

    let mut report = InstallReport {
        scope: Some(scope),
        results: Vec::new(),
        branch_changes: Vec::new(),
        untracked: Vec::new(),
    };

    let store = ctx.store(scope);
    for (index, unit) in units.iter().enumerate() {
        let installed_somewhere = pairs
            .iter()
            .zip(&results)
            .any(|(pair, result)| pair.unit == index && result.outcome.success);
        if !installed_somewhere {
            continue;
        }

        let key = UnitKey::new(unit.kind(), unit.name());
        let entry = StateEntry {
            url: descriptor.url.clone(),
            subpath: descriptor.subpath.clone(),
            branch: branch.clone(),
            commit: commit.clone(),
        };
        let added = match store.add(&key, entry) {
            Ok(added) => added,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to record installation");
                report.untracked.push(TrackingFailure {
                    unit: unit.name().to_string(),
                    kind: unit.kind(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        if let Some(previous) = added.previous_branch.filter(|_| added.updated) {
            report.branch_changes.push(BranchChange {
                unit: unit.name().to_string(),
                kind: unit.kind(),
                previous,
                current: branch.clone(),
            });
        }
    }

    report.results = results;
    print_report(ctx, ui, &report);
    Ok(Outcome::Completed(report))
}

fn matches_any(requested: &[String], name: &str) -> bool {
    requested.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn select_units(
    discovered: &Discovered,
    options: &InstallOptions,
    prompter: &dyn Prompter,
    ui: &Ui,
) -> Result<Option<(Vec<Skill>, Vec<Command>)>> {
    if !options.units.is_empty() {
        let skills: Vec<Skill> = discovered
            .skills
            .iter()
            .filter(|skill| matches_any(&options.units, &skill.name))
            .cloned()
            .collect();
        let commands: Vec<Command> = discovered
            .commands
            .iter()
            .filter(|command| matches_any(&options.units, &command.name))
            .cloned()
            .collect();

        if skills.is_empty() && commands.is_empty() {
            let available: Vec<String> = discovered
                .units()
                .iter()
                .map(|unit| unit.name().to_string())
                .collect();
            return Err(FlinsError::NoMatchingUnits {
                requested: options.units.join(", "),
                available: available.join(", "),
            });
        }

        let missing: Vec<&str> = options
            .units
            .iter()
            .filter(|name| {
                !skills.iter().any(|s| s.name.eq_ignore_ascii_case(name))
                    && !commands.iter().any(|c| c.name.eq_ignore_ascii_case(name))
            })
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            ui.warn(format!("Not found in source: {}", missing.join(", ")));
        }
        return Ok(Some((skills, commands)));
    }

    if options.yes {
        return Ok(Some((
            discovered.skills.clone(),
            discovered.commands.clone(),
        )));
    }

    let skills = match discovered.skills.len() {
        0 => Vec::new(),
        1 if discovered.commands.is_empty() => discovered.skills.clone(),
        _ => {
            let choices: Vec<Choice> = discovered
                .skills
                .iter()
                .map(|skill| Choice::new(&skill.name).with_hint(&skill.description))
                .collect();
            let defaults = vec![false; choices.len()];
            let Some(picked) =
                prompter.multi_select("Select skills to install", &choices, &defaults)?
            else {
                return Ok(None);
            };
            picked
                .into_iter()
                .filter_map(|i| discovered.skills.get(i).cloned())
                .collect()
        }
    };

    let commands = if discovered.commands.is_empty() {
        Vec::new()
    } else {
        let choices: Vec<Choice> = discovered
            .commands
            .iter()
            .map(|command| {
                Choice::new(&command.name)
                    .with_hint(command.description.clone().unwrap_or_default())
            })
            .collect();
        let defaults = vec![false; choices.len()];
        let Some(picked) =
            prompter.multi_select("Select commands to install", &choices, &defaults)?
        else {
            return Ok(None);
        };
        picked
            .into_iter()
            .filter_map(|i| discovered.commands.get(i).cloned())
            .collect()
    };

    Ok(Some((skills, commands)))
}

fn agent_choices(agents: &[Arc<AgentDescriptor>]) -> Vec<Choice> {
    agents
        .iter()
        .map(|agent| Choice::new(&agent.name).with_hint(&agent.id))
        .collect()
}

fn pick_agents(
    prompter: &dyn Prompter,
    message: &str,
    agents: &[Arc<AgentDescriptor>],
    preselect: bool,
) -> Result<Option<Vec<Arc<AgentDescriptor>>>> {
    let defaults = vec![preselect; agents.len()];
    let Some(picked) = prompter.multi_select(message, &agent_choices(agents), &defaults)? else {
        return Ok(None);
    };
    let picked: Vec<Arc<AgentDescriptor>> = picked
        .into_iter()
        .filter_map(|i| agents.get(i).cloned())
        .collect();
    Ok(Some(picked).filter(|picked| !picked.is_empty()))
}

async fn select_skill_agents(
    ctx: &Context,
    options: &InstallOptions,
    prompter: &dyn Prompter,
    ui: &Ui,
) -> Result<Option<Vec<Arc<AgentDescriptor>>>> {
    if !options.agents.is_empty() {
        return ctx.registry.resolve_ids(&options.agents).map(Some);
    }

    let detected = ctx.registry.detect_installed(&ctx.roots).await;
    if detected.is_empty() {
        let all = ctx.registry.all().to_vec();
        if options.yes {
            ui.line("No agents detected, installing for all supported agents.");
            return Ok(Some(all));
        }
        ui.line("No agents detected.");
        return pick_agents(prompter, "Select agents to install skills for", &all, false);
    }

    if options.yes || detected.len() == 1 {
        let names: Vec<&str> = detected.iter().map(|a| a.name.as_str()).collect();
        ui.line(format!("Installing for: {}", names.join(", ")));
        return Ok(Some(detected));
    }

    pick_agents(prompter, "Select agents to install skills for", &detected, true)
}

async fn select_command_agents(
    ctx: &Context,
    options: &InstallOptions,
    prompter: &dyn Prompter,
    ui: &Ui,
) -> Result<Option<Vec<Arc<AgentDescriptor>>>> {
    let capable = ctx.registry.command_capable();
    let capable_names = || {
        capable
            .iter()
            .map(|a| a.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if !options.agents.is_empty() {
        let (supported, unsupported): (Vec<_>, Vec<_>) = ctx
            .registry
            .resolve_ids(&options.agents)?
            .into_iter()
            .partition(|agent| agent.supports_commands());
        if !unsupported.is_empty() {
            let names: Vec<&str> = unsupported.iter().map(|a| a.id.as_str()).collect();
            ui.warn(format!(
                "Skipping commands for agents without command support: {}",
                names.join(", ")
            ));
        }
        if supported.is_empty() {
            return Err(FlinsError::NoCommandAgents(capable_names()));
        }
        return Ok(Some(supported));
    }

    let detected: Vec<Arc<AgentDescriptor>> = ctx
        .registry
        .detect_installed(&ctx.roots)
        .await
        .into_iter()
        .filter(|agent| agent.supports_commands())
        .collect();

    if options.yes {
        return Ok(Some(if detected.is_empty() { capable } else { detected }));
    }

    let defaults: Vec<bool> = capable
        .iter()
        .map(|agent| detected.iter().any(|d| d.id == agent.id))
        .collect();
    let Some(picked) = prompter.multi_select(
        "Select agents to install commands for",
        &agent_choices(&capable),
        &defaults,
    )?
    else {
        return Ok(None);
    };
    let picked: Vec<Arc<AgentDescriptor>> = picked
        .into_iter()
        .filter_map(|i| capable.get(i).cloned())
        .collect();
    Ok(Some(picked).filter(|picked| !picked.is_empty()))
}

fn select_scope(options: &InstallOptions, prompter: &dyn Prompter) -> Result<Option<Scope>> {
    if let Some(global) = options.global {
        return Ok(Some(Scope::from_global_flag(global)));
    }
    if options.yes {
        return Ok(Some(Scope::Project));
    }

    let choices = [
        Choice::new("Project").with_hint("current directory, tracked in ./skills.lock"),
        Choice::new("Global").with_hint("home directory, available in every project"),
    ];
    let picked = prompter.select("Installation scope", &choices)?;
    Ok(picked.map(|index| {
        if index == 1 {
            Scope::Global
        } else {
            Scope::Project
        }
    }))
}

fn plan_pairs(
    ctx: &Context,
    scope: Scope,
    units: &[Unit],
    skill_agents: &[Arc<AgentDescriptor>],
    command_agents: &[Arc<AgentDescriptor>],
) -> Vec<Pair> {
    let mut pairs = Vec::new();
    for (index, unit) in units.iter().enumerate() {
        let agents = match unit.kind() {
            UnitKind::Skill => skill_agents,
            UnitKind::Command => command_agents,
        };
        for agent in agents {
            if let Some(target) = agent.target_path(unit.kind(), unit.name(), scope, &ctx.roots) {
                pairs.push(Pair {
                    unit: index,
                    agent: Arc::clone(agent),
                    target,
                });
            }
        }
    }
    pairs
}

fn print_available(ui: &Ui, discovered: &Discovered) {
    for kind in [UnitKind::Skill, UnitKind::Command] {
        let units: Vec<Unit> = discovered
            .units()
            .into_iter()
            .filter(|unit| unit.kind() == kind)
            .collect();
        if units.is_empty() {
            continue;
        }
        ui.header(&format!("Available {}:", kind.plural()));
        for unit in &units {
            match unit.description() {
                Some(description) if !description.is_empty() => {
                    ui.line(format!("  {}  {}", unit.name(), description))
                }
                _ => ui.line(format!("  {}", unit.name())),
            }
        }
    }
    ui.blank();
    ui.line("Install with: flins add <source> --skill <name>");
}

fn print_summary(ctx: &Context, ui: &Ui, scope: Scope, units: &[Unit], pairs: &[Pair]) {
    ui.header(format!("Installation summary ({} scope):", scope).as_str());
    for (index, unit) in units.iter().enumerate() {
        ui.line(format!("  {} {}", unit.kind(), unit.name()));
        for pair in pairs.iter().filter(|pair| pair.unit == index) {
            let overwrite = if std::fs::symlink_metadata(&pair.target).is_ok() {
                " (will overwrite)"
            } else {
                ""
            };
            ui.line(format!(
                "    → {}: {}{}",
                pair.agent.name,
                ctx.display_path(&pair.target),
                overwrite
            ));
        }
    }
    ui.blank();
}

fn print_report(ctx: &Context, ui: &Ui, report: &InstallReport) {
    for change in &report.branch_changes {
        ui.warn(format!(
            "{} '{}' switched from branch '{}' to '{}'",
            change.kind, change.unit, change.previous, change.current
        ));
    }

    let (installed, failed): (Vec<&PairResult>, Vec<&PairResult>) =
        report.results.iter().partition(|r| r.outcome.success);

    if !installed.is_empty() {
        ui.success(format!("Installed {} item(s)", installed.len()));
        for result in &installed {
            ui.line(format!(
                "  {} → {}",
                result.unit,
                ctx.display_path(&result.outcome.path)
            ));
        }
    }

    if !failed.is_empty() {
        ui.error(format!("Failed to install {} item(s)", failed.len()));
        for result in &failed {
            ui.error(format!(
                "  {} ({}): {}",
                result.unit,
                result.agent,
                result.outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    if !report.untracked.is_empty() {
        ui.error("Installed but not recorded in the lockfile:");
        for failure in &report.untracked {
            ui.error(format!("  {} '{}': {}", failure.kind, failure.unit, failure.error));
        }
    }
}
