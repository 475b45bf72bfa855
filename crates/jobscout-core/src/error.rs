//! Error types for jobscout-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Agent not found
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Task not found
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Tool not found
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Output validation failed
    #[error("output validation failed: {0}")]
    Validation(String),

    /// Tool loop did not converge
    #[error("tool loop exceeded {0} iterations")]
    MaxIterations(usize),

    /// LLM error
    #[error("llm error: {0}")]
    Llm(#[from] jobscout_llm::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
