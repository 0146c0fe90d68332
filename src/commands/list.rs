//! `flins list`: tracked units grouped by scope.

use crate::context::Context;
use crate::error::Result;
use crate::state::{tracked_units, Installation, Scope, StateEntry, TrackedUnit, UnitKey};

#[derive(Debug, Clone)]
pub struct ListedUnit {
    pub key: UnitKey,
    pub scope: Scope,
    pub entry: StateEntry,
    pub installations: Vec<Installation>,
}

/// Print every tracked unit, grouped by scope.
///
/// A unit tracked in both scopes is listed once, under the project.
pub fn execute(ctx: &Context) -> Result<Vec<ListedUnit>> {
    let ui = ctx.ui();
    let project = ctx.store(Scope::Project);
    let global = ctx.store(Scope::Global);
    let units = tracked_units(&project, &global)?;

    let mut listed = Vec::new();
    for (scope, store) in [(Scope::Project, &project), (Scope::Global, &global)] {
        let in_scope: Vec<&TrackedUnit> = units.iter().filter(|u| u.scope == scope).collect();
        if in_scope.is_empty() {
            continue;
        }

        let title = match scope {
            Scope::Project => format!("Project ({})", ctx.display_path(store.path())),
            Scope::Global => format!("Global ({})", ctx.display_path(store.path())),
        };
        ui.header(&title);

        for unit in in_scope {
            let installations = store.valid_installations(&unit.key);
            let agents: Vec<&str> = installations.iter().map(|i| i.agent.as_str()).collect();
            let location = if agents.is_empty() {
                "not installed".to_string()
            } else {
                agents.join(", ")
            };
            ui.line(format!(
                "  {:<24} {:<8} {} [{}]",
                unit.key.name(),
                unit.key.kind,
                unit.entry.url,
                location
            ));
            listed.push(ListedUnit {
                key: unit.key.clone(),
                scope,
                entry: unit.entry.clone(),
                installations,
            });
        }
    }

    if listed.is_empty() {
        ui.line("No skills or commands are tracked. Install some with `flins add <source>`.");
    }

    Ok(listed)
}
