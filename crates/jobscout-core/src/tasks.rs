//! Task Configuration
//!
//! Tasks are declared in YAML with `{placeholder}` templates rendered at
//! assembly time (the search query, the output schema).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Declarative task definition loaded from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// What the agent should do (may contain placeholders)
    pub description: String,
    /// What a good answer looks like (may contain placeholders)
    #[serde(default)]
    pub expected_output: String,
    /// Id of the agent responsible for this task
    pub agent: String,
}

/// Library of task definitions keyed by id
#[derive(Debug, Clone, Default)]
pub struct TaskLibrary {
    tasks: HashMap<String, TaskSpec>,
}

impl TaskLibrary {
    /// Load task definitions from a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse task definitions from YAML text
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let tasks: HashMap<String, TaskSpec> = serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid task config: {}", e)))?;
        Ok(Self { tasks })
    }

    /// Get a task spec by id
    pub fn get(&self, id: &str) -> Result<&TaskSpec> {
        self.tasks
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Build a runtime task by id, rendering placeholders with `vars`
    pub fn task(&self, id: &str, vars: &HashMap<&str, String>) -> Result<Task> {
        let spec = self.get(id)?;
        Ok(Task {
            id: id.to_string(),
            spec: TaskSpec {
                description: render(&spec.description, vars),
                expected_output: render(&spec.expected_output, vars),
                agent: spec.agent.clone(),
            },
        })
    }

    /// Number of defined tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the library is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Replace `{name}` placeholders with values from `vars`.
///
/// Placeholders without a matching entry are left intact, so literal
/// braces in prompts (e.g. JSON examples) survive rendering.
#[must_use]
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

/// A runtime task: an id plus its rendered spec
#[derive(Debug, Clone)]
pub struct Task {
    /// Task id (the YAML key)
    pub id: String,
    /// The task's rendered definition
    pub spec: TaskSpec,
}

impl Task {
    /// Compose the user prompt for this task, appending context from
    /// previously completed tasks.
    #[must_use]
    pub fn prompt(&self, context: &[String]) -> String {
        let mut prompt = self.spec.description.clone();

        if !self.spec.expected_output.is_empty() {
            prompt.push_str("\n\nExpected output:\n");
            prompt.push_str(&self.spec.expected_output);
        }

        if !context.is_empty() {
            prompt.push_str("\n\nContext from previous steps:\n");
            prompt.push_str(&context.join("\n\n---\n\n"));
        }

        prompt
    }
}
