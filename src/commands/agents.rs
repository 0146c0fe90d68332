use crate::agents::AgentDescriptor;
use crate::context::Context;
use crate::error::Result;
use crate::state::Scope;
use std::sync::Arc;

/// One row of `flins agents`.
#[derive(Debug, Clone)]
pub struct AgentRow {
    pub agent: Arc<AgentDescriptor>,
    pub detected: bool,
}

/// List detected agents, or every supported agent with `all`.
pub async fn execute(ctx: &Context, all: bool) -> Result<Vec<AgentRow>> {
    let detected = ctx.registry.detect_installed(&ctx.roots).await;
    let rows: Vec<AgentRow> = ctx
        .registry
        .all()
        .iter()
        .map(|agent| AgentRow {
            detected: detected.iter().any(|d| d.id == agent.id),
            agent: Arc::clone(agent),
        })
        .filter(|row| all || row.detected)
        .collect();

    let ui = ctx.ui();
    if rows.is_empty() {
        ui.line(
            "No supported agents detected. Use `flins agents --all` to see every supported agent.",
        );
        return Ok(rows);
    }

    ui.header(if all { "Supported agents:" } else { "Detected agents:" });
    for row in &rows {
        let marker = if row.detected { "✓" } else { " " };
        let commands = if row.agent.supports_commands() {
            " [commands]"
        } else {
            ""
        };
        ui.line(format!(
            "  {} {:<14} {}{}",
            marker, row.agent.id, row.agent.name, commands
        ));
        ui.line(format!(
            "      skills: {}",
            ctx.display_path(&row.agent.skills_path(Scope::Global, &ctx.roots))
        ));
    }
    Ok(rows)
}
