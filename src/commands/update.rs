//! Checking tracked units against their remotes and reinstalling the stale ones.

use super::Outcome;
use crate::context::Context;
use crate::discovery::discover;
use crate::error::{FlinsError, Result};
use crate::fetcher::RepositoryFetcher;
use crate::installer::{InstallMode, InstallOutcome, Installer, Payload};
use crate::prompt::{Choice, Prompter};
use crate::state::{tracked_units, Installation, Scope, TrackedUnit};
use futures_util::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Latest,
    UpdateAvailable,
    /// The remote could not be queried.
    Error,
    /// No valid installation is left on disk.
    Orphaned,
}

impl UpdateStatus {
    pub fn label(self) -> &'static str {
        match self {
            UpdateStatus::Latest => "latest",
            UpdateStatus::UpdateAvailable => "update-available",
            UpdateStatus::Error => "error",
            UpdateStatus::Orphaned => "orphaned",
        }
    }
}

/// An installation found for a tracked unit, with its validity at check time.
#[derive(Debug, Clone)]
pub struct InstallationStatus {
    pub installation: Installation,
    pub valid: bool,
}

#[derive(Debug, Clone)]
pub struct StatusResult {
    pub unit: TrackedUnit,
    pub status: UpdateStatus,
    pub latest_commit: Option<String>,
    pub installations: Vec<InstallationStatus>,
    pub error: Option<String>,
}

impl StatusResult {
    pub fn valid_installations(&self) -> impl Iterator<Item = &Installation> {
        self.installations
            .iter()
            .filter(|status| status.valid)
            .map(|status| &status.installation)
    }
}

/// Tracked units in both scopes, limited to `names` when any are given.
pub fn select_tracked(ctx: &Context, names: &[String]) -> Result<Vec<TrackedUnit>> {
    let units = tracked_units(&ctx.store(Scope::Project), &ctx.store(Scope::Global))?;
    if names.is_empty() {
        return Ok(units);
    }
    Ok(units
        .into_iter()
        .filter(|unit| names.iter().any(|name| unit.key.matches(name)))
        .collect())
}

async fn check_one(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    unit: TrackedUnit,
) -> StatusResult {
    let installations: Vec<InstallationStatus> = ctx
        .store(unit.scope)
        .find_installations(&unit.key)
        .into_iter()
        .map(|installation| InstallationStatus {
            valid: installation.is_valid(),
            installation,
        })
        .collect();

    if !installations.iter().any(|status| status.valid) {
        return StatusResult {
            unit,
            status: UpdateStatus::Orphaned,
            latest_commit: None,
            installations,
            error: None,
        };
    }

    match fetcher
        .latest_commit(&unit.entry.url, &unit.entry.branch)
        .await
    {
        Ok(latest) => {
            let status = if latest == unit.entry.commit {
                UpdateStatus::Latest
            } else {
                UpdateStatus::UpdateAvailable
            };
            StatusResult {
                unit,
                status,
                latest_commit: Some(latest),
                installations,
                error: None,
            }
        }
        Err(e) => {
            tracing::debug!(key = %unit.key, error = %e, "latest commit lookup failed");
            StatusResult {
                unit,
                status: UpdateStatus::Error,
                latest_commit: None,
                installations,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Read-only status of every tracked unit (or just `names`).
///
/// Orphaned units are never looked up remotely. A failed lookup marks only
/// that unit as [`UpdateStatus::Error`].
pub async fn check_status(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    names: &[String],
) -> Result<Vec<StatusResult>> {
    let units = select_tracked(ctx, names)?;
    Ok(join_all(units.into_iter().map(|unit| check_one(ctx, fetcher, unit))).await)
}

/// Result of reinstalling one unit.
#[derive(Debug, Clone)]
pub struct UnitUpdate {
    pub unit: TrackedUnit,
    pub updated: usize,
    pub failed: usize,
    pub new_commit: Option<String>,
    pub error: Option<String>,
}

impl UnitUpdate {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed == 0 && self.updated > 0
    }
}

#[derive(Debug, Default)]
pub struct UpdateReport {
    pub statuses: Vec<StatusResult>,
    pub updates: Vec<UnitUpdate>,
}

impl UpdateReport {
    /// A unit whose remote could not be checked counts as a failure too.
    pub fn has_failures(&self) -> bool {
        self.statuses
            .iter()
            .any(|status| status.status == UpdateStatus::Error)
            || self.updates.iter().any(|update| !update.is_success())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub yes: bool,
}

pub async fn execute(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    prompter: &dyn Prompter,
    names: &[String],
    options: &UpdateOptions,
) -> Result<Outcome<UpdateReport>> {
    let ui = ctx.ui();

    let spinner = ui.spinner("Checking for updates...");
    let statuses = check_status(ctx, fetcher, names).await?;
    spinner.clear();

    if statuses.is_empty() {
        if names.is_empty() {
            ui.line(
                "No skills or commands are tracked yet. Install some with `flins add <source>`.",
            );
        } else {
            ui.warn(format!("Not tracked: {}", names.join(", ")));
        }
        return Ok(Outcome::Completed(UpdateReport {
            statuses,
            updates: Vec::new(),
        }));
    }

    let orphaned: Vec<&StatusResult> = statuses
        .iter()
        .filter(|s| s.status == UpdateStatus::Orphaned)
        .collect();
    let errored: Vec<&StatusResult> = statuses
        .iter()
        .filter(|s| s.status == UpdateStatus::Error)
        .collect();

    for result in &errored {
        ui.warn(format!(
            "Could not check {}: {}",
            result.unit.key.name(),
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    if !orphaned.is_empty() {
        let names: Vec<&str> = orphaned.iter().map(|s| s.unit.key.name()).collect();
        ui.warn(format!(
            "{} tracked item(s) have no valid installation: {}. \
             Run `flins clean` to stop tracking them.",
            orphaned.len(),
            names.join(", ")
        ));
    }

    let available: Vec<&StatusResult> = statuses
        .iter()
        .filter(|s| s.status == UpdateStatus::UpdateAvailable)
        .collect();

    if available.is_empty() {
        if orphaned.is_empty() && errored.is_empty() {
            ui.success("Everything is up to date");
        } else {
            ui.line("No updates available for the remaining items.");
        }
        return Ok(Outcome::Completed(UpdateReport {
            statuses,
            updates: Vec::new(),
        }));
    }

    let selected: Vec<&StatusResult> = if options.yes {
        available
    } else {
        let choices: Vec<Choice> = available
            .iter()
            .map(|s| {
                Choice::new(s.unit.key.name()).with_hint(format!(
                    "{} {} → {}",
                    s.unit.scope,
                    short(&s.unit.entry.commit),
                    short(s.latest_commit.as_deref().unwrap_or(""))
                ))
            })
            .collect();
        let defaults = vec![true; choices.len()];
        let picked =
            or_cancel!(prompter.multi_select("Select items to update", &choices, &defaults)?);
        if picked.is_empty() {
            ui.line("Nothing selected.");
            return Ok(Outcome::Cancelled);
        }
        let proceed = or_cancel!(prompter.confirm(
            &format!("Update {} item(s)?", picked.len()),
            true
        )?);
        if !proceed {
            ui.line("Update cancelled.");
            return Ok(Outcome::Cancelled);
        }
        picked
            .into_iter()
            .filter_map(|i| available.get(i).copied())
            .collect()
    };

    let mut updates = Vec::new();
    for status in selected {
        let spinner = ui.spinner(format!("Updating {}...", status.unit.key.name()));
        let update = update_one(ctx, fetcher, status).await;
        match (&update.error, update.failed) {
            (None, 0) => spinner.finish(format!(
                "Updated {} ({} installation(s))",
                update.unit.key.name(),
                update.updated
            )),
            (Some(e), _) => spinner.fail(format!("{}: {}", update.unit.key.name(), e)),
            (None, failed) => spinner.fail(format!(
                "{}: {} installation(s) updated, {} failed",
                update.unit.key.name(),
                update.updated,
                failed
            )),
        }
        updates.push(update);
    }

    Ok(Outcome::Completed(UpdateReport { statuses, updates }))
}

/// Re-fetch one unit and reinstall it into every installation that was valid.
///
/// Symlinked installations are refreshed through the store, plain copies are
/// copied over. The new commit is recorded only if at least one
/// reinstallation succeeded.
pub async fn update_one(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    status: &StatusResult,
) -> UnitUpdate {
    let unit = status.unit.clone();
    let mut result = UnitUpdate {
        unit: unit.clone(),
        updated: 0,
        failed: 0,
        new_commit: None,
        error: None,
    };

    let checkout = match fetcher
        .clone_repo(&unit.entry.url, Some(&unit.entry.branch))
        .await
    {
        Ok(checkout) => checkout,
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    };

    let outcome = reinstall(ctx, fetcher, status, checkout.path(), &mut result).await;
    checkout.cleanup();
    if let Err(e) = outcome {
        result.error = Some(e);
    }
    result
}

async fn reinstall(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    status: &StatusResult,
    checkout: &std::path::Path,
    result: &mut UnitUpdate,
) -> std::result::Result<(), String> {
    let unit = &status.unit;
    let commit = fetcher
        .commit_hash(checkout)
        .await
        .map_err(|e| e.to_string())?;

    let discovered = discover(checkout, unit.entry.subpath.as_deref(), &ctx.registry);
    let fresh = discovered
        .units()
        .into_iter()
        .find(|candidate| {
            candidate.kind() == unit.key.kind && candidate.matches_name(unit.key.name())
        })
        .ok_or_else(|| {
            FlinsError::UnitNotInRepository {
                kind: unit.key.kind.to_string(),
                name: unit.key.name().to_string(),
            }
            .to_string()
        })?;

    let targets: Vec<Installation> = status
        .valid_installations()
        .filter(|installation| installation.is_valid())
        .cloned()
        .collect();
    if targets.is_empty() {
        return Err("no valid installation left to update".to_string());
    }

    let store = ctx.payload_store(unit.scope);
    let copier = Installer::new(InstallMode::Copy, store.clone());
    let linker = Installer::new(InstallMode::Symlink, store);

    let needs_link = targets.iter().any(Installation::is_symlink);
    let needs_copy = targets.iter().any(|t| !t.is_symlink());
    let link_payload: Option<Payload> = if needs_link {
        Some(linker.prepare(&fresh).await)
    } else {
        None
    };
    let copy_payload: Option<Payload> = if needs_copy {
        Some(copier.prepare(&fresh).await)
    } else {
        None
    };

    let installs = targets.iter().map(|target| {
        let (installer, payload) = if target.is_symlink() {
            (&linker, &link_payload)
        } else {
            (&copier, &copy_payload)
        };
        let fresh = &fresh;
        async move {
            match payload {
                Some(payload) => installer.install(fresh.kind(), payload, &target.path).await,
                None => InstallOutcome::failed(
                    target.path.clone(),
                    "payload was not prepared",
                ),
            }
        }
    });
    for outcome in join_all(installs).await {
        if outcome.success {
            result.updated += 1;
        } else {
            result.failed += 1;
            tracing::warn!(
                path = %outcome.path.display(),
                error = outcome.error.as_deref().unwrap_or(""),
                "reinstall failed"
            );
        }
    }

    if result.updated > 0 {
        ctx.store(unit.scope)
            .set_commit(&unit.key, &commit)
            .map_err(|e| e.to_string())?;
        result.new_commit = Some(commit);
    }
    Ok(())
}

pub fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}
