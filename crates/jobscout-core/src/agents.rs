//! Agent Configuration
//!
//! Agents are declared in YAML (role, goal, backstory, tools) and bound
//! to tools and an LLM provider at crew assembly time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Declarative agent definition loaded from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Short role title (e.g. "Job Search Expert")
    pub role: String,
    /// What the agent is trying to achieve
    pub goal: String,
    /// Persona backstory woven into the system prompt
    pub backstory: String,
    /// Whether to log the agent's intermediate output
    #[serde(default)]
    pub verbose: bool,
    /// Names of tools the agent may call (empty = no tools)
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Library of agent definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct AgentLibrary {
    agents: HashMap<String, AgentSpec>,
}

impl AgentLibrary {
    /// Load agent definitions from a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse agent definitions from YAML text
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let agents: HashMap<String, AgentSpec> = serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid agent config: {}", e)))?;
        Ok(Self { agents })
    }

    /// Get an agent spec by id
    pub fn get(&self, id: &str) -> Result<&AgentSpec> {
        self.agents
            .get(id)
            .ok_or_else(|| Error::AgentNotFound(id.to_string()))
    }

    /// Build a runtime agent by id
    pub fn agent(&self, id: &str) -> Result<Agent> {
        Ok(Agent {
            id: id.to_string(),
            spec: self.get(id)?.clone(),
        })
    }

    /// All defined agent ids
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.agents.keys().map(|s| s.as_str()).collect()
    }

    /// Number of defined agents
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// A runtime agent: an id plus its spec
#[derive(Debug, Clone)]
pub struct Agent {
    /// Agent id (the YAML key)
    pub id: String,
    /// The agent's definition
    pub spec: AgentSpec,
}

impl Agent {
    /// Compose the system prompt from role, backstory, and goal
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}.\n{}\n\nYour personal goal is: {}",
            self.spec.role, self.spec.backstory, self.spec.goal
        )
    }

    /// Whether the agent has any tools bound
    #[must_use]
    pub fn has_tools(&self) -> bool {
        !self.spec.tools.is_empty()
    }
}
