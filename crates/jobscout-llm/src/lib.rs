//! Jobscout LLM - LLM Provider Abstraction
//!
//! This crate provides LLM integration for the jobscout pipeline:
//! - Provider: trait definition shared by all backends
//! - Gemini: Google Gemini provider over reqwest
//! - Message/Completion: conversation and request/response types
//! - Tools: function-calling definitions and tool calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod gemini;
pub mod message;
pub mod provider;
pub mod tools;
pub mod util;

pub use completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use tools::{ToolCall, ToolChoice, ToolDefinition};
