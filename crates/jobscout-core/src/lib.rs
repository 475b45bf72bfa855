//! Jobscout Core - Crew Orchestration
//!
//! This crate assembles the job-search pipeline:
//! - Agents: role definitions loaded from YAML
//! - Tasks: work units with placeholder templates
//! - Crew: sequential executor handing context between tasks
//! - Results: the structured job schema and output validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod crew;
pub mod error;
pub mod results;
pub mod tasks;

pub use agents::{Agent, AgentLibrary, AgentSpec};
pub use crew::{Crew, CrewBuilder, CrewConfig};
pub use error::{Error, Result};
pub use results::{Job, JobResults};
pub use tasks::{render, Task, TaskLibrary, TaskSpec};
