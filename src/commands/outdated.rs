//! `flins outdated`: show which tracked units have upstream changes.

use super::update::{check_status, short, StatusResult, UpdateStatus};
use crate::context::Context;
use crate::error::Result;
use crate::fetcher::RepositoryFetcher;
use crate::ui::Ui;

pub async fn execute(
    ctx: &Context,
    fetcher: &dyn RepositoryFetcher,
    names: &[String],
    verbose: bool,
) -> Result<Vec<StatusResult>> {
    let ui = ctx.ui();

    let spinner = ui.spinner("Checking status...");
    let statuses = check_status(ctx, fetcher, names).await?;
    spinner.clear();

    if statuses.is_empty() {
        if names.is_empty() {
            ui.line("No skills or commands are tracked.");
        } else {
            ui.warn(format!("Not tracked: {}", names.join(", ")));
        }
        return Ok(statuses);
    }

    ui.header("Status:");
    for result in &statuses {
        print_status(ctx, &ui, result, verbose);
    }
    print_totals(&ui, &statuses);

    Ok(statuses)
}

fn print_status(ctx: &Context, ui: &Ui, result: &StatusResult, verbose: bool) {
    let unit = &result.unit;
    let detail = match result.status {
        UpdateStatus::Latest => short(&unit.entry.commit).to_string(),
        UpdateStatus::UpdateAvailable => format!(
            "{} → {}",
            short(&unit.entry.commit),
            short(result.latest_commit.as_deref().unwrap_or(""))
        ),
        UpdateStatus::Error => result.error.clone().unwrap_or_default(),
        UpdateStatus::Orphaned => "no valid installation".to_string(),
    };
    ui.line(format!(
        "  {:<24} {:<8} {:<8} {:<17} {}",
        unit.key.name(),
        unit.key.kind,
        unit.scope,
        result.status.label(),
        detail
    ));

    if !verbose {
        return;
    }
    ui.line(format!("      source: {}", unit.entry.url));
    ui.line(format!("      branch: {}", unit.entry.branch));
    if let Some(subpath) = &unit.entry.subpath {
        ui.line(format!("      path:   {}", subpath));
    }
    for status in &result.installations {
        let marker = if status.valid { "✓" } else { "✗" };
        ui.line(format!(
            "      {} {} {}",
            marker,
            status.installation.agent,
            ctx.display_path(&status.installation.path)
        ));
    }
}

fn print_totals(ui: &Ui, statuses: &[StatusResult]) {
    let count = |status: UpdateStatus| statuses.iter().filter(|s| s.status == status).count();
    ui.blank();
    ui.line(format!(
        "{} up to date, {} with updates, {} orphaned, {} failed to check",
        count(UpdateStatus::Latest),
        count(UpdateStatus::UpdateAvailable),
        count(UpdateStatus::Orphaned),
        count(UpdateStatus::Error)
    ));
    if count(UpdateStatus::UpdateAvailable) > 0 {
        ui.line("Run `flins update` to install the latest versions.");
    }
    if count(UpdateStatus::Orphaned) > 0 {
        ui.line("Run `flins clean` to stop tracking orphaned items.");
    }
}
