//! Builtins - Built-in tools for the jobscout pipeline
//!
//! - Search tools: serper_search, search_and_filter
//! - HTTP tools: scrape_website
//! - File tools: file_read

mod file;
mod scrape;
mod search_filter;
mod serper;

pub use file::FileReadTool;
pub use scrape::ScrapeWebsiteTool;
pub use search_filter::SearchAndFilterTool;
pub use serper::{OrganicResult, SerperConfig, SerperSearchTool};

use crate::error::Result;
use crate::registry::ToolRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for built-in tools
#[derive(Debug, Clone, Default)]
pub struct BuiltinsConfig {
    /// serper.dev API key
    pub serper_api_key: String,
    /// Number of search results to request (0 = tool default)
    pub num_results: usize,
    /// Path to the resume file bound to file_read
    pub resume_path: Option<PathBuf>,
}

/// Register all built-in tools with the registry
pub fn register_builtins(registry: &mut ToolRegistry, config: &BuiltinsConfig) -> Result<()> {
    let mut serper_config = SerperConfig::new(config.serper_api_key.clone());
    if config.num_results > 0 {
        serper_config.num_results = config.num_results;
    }

    let search = Arc::new(SerperSearchTool::new(serper_config)?);

    // Raw search plus the filtered wrapper around the same tool
    registry.register(search.clone());
    registry.register(Arc::new(SearchAndFilterTool::new(search)));

    registry.register(Arc::new(ScrapeWebsiteTool::new()?));

    registry.register(Arc::new(FileReadTool::with_default_path(
        config.resume_path.clone(),
    )));

    Ok(())
}
