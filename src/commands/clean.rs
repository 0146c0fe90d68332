//! `flins clean`: stop tracking units that are no longer installed anywhere.

use crate::context::Context;
use crate::error::Result;
use crate::state::{Scope, UnitKey};

#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: Vec<(Scope, UnitKey)>,
}

/// Clean the global lockfile, and the project lockfile when there is one.
pub fn execute(ctx: &Context) -> Result<CleanReport> {
    let ui = ctx.ui();
    let mut report = CleanReport::default();

    for scope in [Scope::Project, Scope::Global] {
        let store = ctx.store(scope);
        if scope == Scope::Project && !store.exists() {
            continue;
        }
        for key in store.clean_orphaned()? {
            report.removed.push((scope, key));
        }
    }

    if report.removed.is_empty() {
        ui.success("Nothing to clean, every tracked item is installed");
    } else {
        let noun = if report.removed.len() == 1 { "entry" } else { "entries" };
        ui.success(format!("Removed {} orphaned {}", report.removed.len(), noun));
        for (scope, key) in &report.removed {
            ui.line(format!("  {} {} ({})", key.kind, key.name(), scope));
        }
    }

    Ok(report)
}
