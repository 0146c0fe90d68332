//! `flins remove`: delete installed units and stop tracking them.

use super::update::select_tracked;
use super::Outcome;
use crate::context::Context;
use crate::error::Result;
use crate::installer::remove_installation;
use crate::prompt::{Choice, Prompter};
use crate::state::{Installation, TrackedUnit};

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub yes: bool,
}

#[derive(Debug, Clone)]
pub struct InstallationRemoval {
    pub installation: Installation,
    pub removed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UnitRemoval {
    pub unit: TrackedUnit,
    pub installations: Vec<InstallationRemoval>,
    /// The lockfile entry was dropped.
    pub untracked: bool,
    /// Why the lockfile entry could not be dropped.
    pub state_error: Option<String>,
}

impl UnitRemoval {
    pub fn removed(&self) -> usize {
        self.installations.iter().filter(|i| i.removed).count()
    }

    pub fn failed(&self) -> usize {
        self.installations.iter().filter(|i| !i.removed).count()
    }
}

#[derive(Debug, Default)]
pub struct RemoveReport {
    pub removals: Vec<UnitRemoval>,
    /// Requested names that are not tracked in either scope.
    pub unknown: Vec<String>,
    /// Requested units that are tracked but have no valid installation.
    pub not_installed: Vec<String>,
}

impl RemoveReport {
    pub fn has_failures(&self) -> bool {
        !self.unknown.is_empty()
            || !self.not_installed.is_empty()
            || self.removals.iter().any(|r| r.failed() > 0 || !r.untracked)
    }
}

struct Candidate {
    unit: TrackedUnit,
    installations: Vec<Installation>,
}

pub async fn execute(
    ctx: &Context,
    prompter: &dyn Prompter,
    names: &[String],
    options: &RemoveOptions,
) -> Result<Outcome<RemoveReport>> {
    let ui = ctx.ui();
    let mut report = RemoveReport::default();

    let tracked = select_tracked(ctx, names)?;
    report.unknown = names
        .iter()
        .filter(|name| !tracked.iter().any(|unit| unit.key.matches(name)))
        .cloned()
        .collect();
    if !report.unknown.is_empty() {
        ui.warn(format!("Not tracked: {}", report.unknown.join(", ")));
    }

    let mut candidates = Vec::new();
    for unit in tracked {
        let installations = ctx.store(unit.scope).valid_installations(&unit.key);
        if installations.is_empty() {
            if !names.is_empty() {
                report.not_installed.push(unit.key.name().to_string());
            }
            continue;
        }
        candidates.push(Candidate {
            unit,
            installations,
        });
    }
    if !report.not_installed.is_empty() {
        ui.warn(format!(
            "No valid installation found for: {}. Run `flins clean` to stop tracking them.",
            report.not_installed.join(", ")
        ));
    }

    if candidates.is_empty() {
        if names.is_empty() {
            ui.line("Nothing installed to remove.");
        }
        return Ok(Outcome::Completed(report));
    }

    let selected: Vec<Candidate> = if !names.is_empty() || options.yes {
        candidates
    } else {
        let choices: Vec<Choice> = candidates
            .iter()
            .map(|c| {
                Choice::new(c.unit.key.name()).with_hint(format!(
                    "{}, {}, {} installation(s)",
                    c.unit.key.kind,
                    c.unit.scope,
                    c.installations.len()
                ))
            })
            .collect();
        let defaults = vec![false; choices.len()];
        let picked =
            or_cancel!(prompter.multi_select("Select items to remove", &choices, &defaults)?);
        if picked.is_empty() {
            ui.line("Nothing selected.");
            return Ok(Outcome::Cancelled);
        }
        candidates
            .into_iter()
            .enumerate()
            .filter(|(index, _)| picked.contains(index))
            .map(|(_, candidate)| candidate)
            .collect()
    };

    ui.header("Will remove:");
    for candidate in &selected {
        let unit = &candidate.unit;
        ui.line(format!("  {} {} ({})", unit.key.kind, unit.key.name(), unit.scope));
        for installation in &candidate.installations {
            ui.line(format!("    → {}", ctx.display_path(&installation.path)));
        }
    }
    ui.blank();

    if !options.yes {
        let proceed = or_cancel!(prompter.confirm("Remove these items?", false)?);
        if !proceed {
            ui.line("Removal cancelled.");
            return Ok(Outcome::Cancelled);
        }
    }

    for candidate in selected {
        let removal = remove_unit(ctx, candidate).await;
        if removal.failed() == 0 && removal.state_error.is_none() {
            ui.success(format!("Removed {}", removal.unit.key.name()));
        }
        for failure in removal.installations.iter().filter(|i| !i.removed) {
            ui.error(format!(
                "Failed to remove {}: {}",
                ctx.display_path(&failure.installation.path),
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
        if let Some(error) = &removal.state_error {
            ui.error(format!(
                "Removed files for {} but could not update the lockfile: {}",
                removal.unit.key.name(),
                error
            ));
        }
        report.removals.push(removal);
    }

    Ok(Outcome::Completed(report))
}

/// Delete every installation, then drop the entry if anything was deleted.
async fn remove_unit(ctx: &Context, candidate: Candidate) -> UnitRemoval {
    let mut installations = Vec::new();
    for installation in candidate.installations {
        let outcome = remove_installation(&installation.path).await;
        installations.push(InstallationRemoval {
            installation,
            removed: outcome.success,
            error: outcome.error,
        });
    }

    let mut removal = UnitRemoval {
        unit: candidate.unit,
        installations,
        untracked: false,
        state_error: None,
    };
    if removal.removed() > 0 {
        match ctx.store(removal.unit.scope).remove(&removal.unit.key) {
            Ok(_) => removal.untracked = true,
            Err(e) => {
                let key = &removal.unit.key;
                tracing::warn!(key = %key, error = %e, "failed to drop lockfile entry");
                removal.state_error = Some(e.to_string());
            }
        }
    }
    removal
}
