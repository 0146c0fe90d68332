//! Agent registry for loading the supported agents and detecting installed ones.

use super::definition::AgentDescriptor;
use crate::context::Roots;
use crate::error::{FlinsError, Result};
use futures_util::future::join_all;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

const BUILTIN_REGISTRY: &str = include_str!("../../agents/registry.toml");

#[derive(Deserialize)]
struct RegistryFile {
    agents: Vec<AgentDescriptor>,
}

/// Ordered registry of supported agents
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<Arc<AgentDescriptor>>,
}

impl AgentRegistry {
    /// Load the embedded agent table
    pub fn load() -> Result<Self> {
        Self::from_toml(BUILTIN_REGISTRY)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(contents).map_err(|e| {
            FlinsError::InvalidConfig(format!("Failed to parse agent registry: {}", e))
        })?;

        let mut seen = HashSet::new();
        for agent in &file.agents {
            validate_agent(agent)?;
            if !seen.insert(agent.id.clone()) {
                return Err(FlinsError::InvalidConfig(format!(
                    "Duplicate agent id '{}'",
                    agent.id
                )));
            }
        }

        Ok(Self {
            agents: file.agents.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn get(&self, id: &str) -> Option<Arc<AgentDescriptor>> {
        self.agents.iter().find(|agent| agent.id == id).cloned()
    }

    pub fn all(&self) -> &[Arc<AgentDescriptor>] {
        &self.agents
    }

    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|agent| agent.id.as_str()).collect()
    }

    /// Agents that have a commands directory in both scopes
    pub fn command_capable(&self) -> Vec<Arc<AgentDescriptor>> {
        self.agents
            .iter()
            .filter(|agent| agent.supports_commands())
            .cloned()
            .collect()
    }

    /// Resolve agent ids given on the command line.
    ///
    /// Every id must be known; the error lists both the unknown ids and
    /// the valid ones.
    pub fn resolve_ids(&self, ids: &[String]) -> Result<Vec<Arc<AgentDescriptor>>> {
        let invalid: Vec<&str> = ids
            .iter()
            .filter(|id| self.get(id).is_none())
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(FlinsError::UnknownAgents {
                invalid: invalid.join(", "),
                valid: self.ids().join(", "),
            });
        }

        let mut resolved: Vec<Arc<AgentDescriptor>> = Vec::new();
        for id in ids {
            if resolved.iter().any(|agent| &agent.id == id) {
                continue;
            }
            if let Some(agent) = self.get(id) {
                resolved.push(agent);
            }
        }
        Ok(resolved)
    }

    /// Agents whose config directory exists, in registry order.
    pub async fn detect_installed(&self, roots: &Roots) -> Vec<Arc<AgentDescriptor>> {
        let checks = self.agents.iter().map(|agent| {
            let path = agent.config_path(roots);
            async move {
                let installed = tokio::fs::try_exists(&path).await.unwrap_or(false);
                (agent, installed)
            }
        });

        join_all(checks)
            .await
            .into_iter()
            .filter(|(_, installed)| *installed)
            .map(|(agent, _)| Arc::clone(agent))
            .collect()
    }
}

/// Validate that an agent definition is complete and usable
fn validate_agent(agent: &AgentDescriptor) -> Result<()> {
    if agent.id.is_empty() {
        return Err(FlinsError::InvalidConfig(
            "Agent id cannot be empty".to_string(),
        ));
    }
    if agent.skills_dir.is_empty() || agent.global_skills_dir.is_empty() {
        return Err(FlinsError::InvalidConfig(format!(
            "Agent '{}' must declare both skills directories",
            agent.id
        )));
    }
    // Commands are all-or-nothing so an install never lands in only one scope.
    if agent.commands_dir.is_some() != agent.global_commands_dir.is_some() {
        return Err(FlinsError::InvalidConfig(format!(
            "Agent '{}' declares a commands directory for only one scope",
            agent.id
        )));
    }
    Ok(())
}
