//! `flins search`: browse the public skill directory.

use super::Outcome;
use crate::context::Context;
use crate::error::{FlinsError, Result};
use crate::prompt::{Choice, Prompter};
use crate::version::{PKG_NAME, VERSION};
use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// One published entry in the skill directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: String,
    #[serde(default)]
    pub author: Option<String>,
}

pub async fn fetch_directory(url: &str) -> Result<Vec<DirectoryEntry>> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(format!("{}/{}", PKG_NAME, VERSION))
        .build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(FlinsError::NetworkError(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }
    Ok(response.json::<Vec<DirectoryEntry>>().await?)
}

/// Entries whose name or description contains `query`, ignoring case.
pub fn filter_entries(entries: Vec<DirectoryEntry>, query: Option<&str>) -> Vec<DirectoryEntry> {
    let query = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return entries,
    };
    entries
        .into_iter()
        .filter(|entry| {
            entry.name.to_lowercase().contains(&query)
                || entry.description.to_lowercase().contains(&query)
        })
        .collect()
}

/// Print matching entries. With `interactive`, let the user pick one and
/// return its source for installation.
pub async fn execute(
    ctx: &Context,
    prompter: &dyn Prompter,
    query: Option<&str>,
    interactive: bool,
) -> Result<Outcome<Option<String>>> {
    let ui = ctx.ui();
    let url = &ctx.config.search.directory_url;

    let spinner = ui.spinner("Fetching skill directory...");
    let entries = match fetch_directory(url).await {
        Ok(entries) => {
            spinner.clear();
            entries
        }
        Err(e) => {
            spinner.fail(format!("Could not fetch {}", url));
            return Err(e);
        }
    };
    tracing::debug!(count = entries.len(), url = %url, "fetched skill directory");

    let matches = filter_entries(entries, query);
    if matches.is_empty() {
        match query {
            Some(q) => ui.line(format!("No skills matching '{}'.", q)),
            None => ui.line("The skill directory is empty."),
        }
        return Ok(Outcome::Completed(None));
    }

    if interactive {
        let choices: Vec<Choice> = matches
            .iter()
            .map(|entry| Choice::new(&entry.name).with_hint(&entry.description))
            .collect();
        let picked = or_cancel!(prompter.select("Select a skill to install", &choices)?);
        return Ok(Outcome::Completed(
            matches.get(picked).map(|entry| entry.source.clone()),
        ));
    }

    for entry in &matches {
        match &entry.author {
            Some(author) => ui.line(format!("{} (by {})", entry.name, author)),
            None => ui.line(&entry.name),
        }
        if !entry.description.is_empty() {
            ui.line(format!("  {}", entry.description));
        }
        ui.line(format!("  flins add {}", entry.source));
        ui.blank();
    }
    ui.line(format!("{} result(s)", matches.len()));
    Ok(Outcome::Completed(None))
}
