//! Jobscout Tools - Tool Registry and Built-in Tools
//!
//! This crate provides the tool system for the jobscout pipeline:
//! - Registry: tool registration and discovery
//! - Builtins: search, filter, scrape, and file tools

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod registry;

pub use builtins::{register_builtins, BuiltinsConfig};
pub use error::{Error, Result};
pub use registry::{RiskLevel, Tool, ToolCategory, ToolDefinition, ToolRegistry, ToolResult};
