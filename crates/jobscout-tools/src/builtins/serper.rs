//! Serper search tool — Google results via the serper.dev API

use crate::error::{Error, Result};
use crate::registry::{RiskLevel, Tool, ToolCategory, ToolDefinition, ToolResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Serper API endpoint
const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// Maximum number of results the API accepts per request
const MAX_RESULTS_CAP: usize = 100;

/// Default number of results (broad initial sweep, narrowed by the filter)
const DEFAULT_NUM_RESULTS: usize = 100;

/// HTTP timeout for search requests (seconds)
const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Serper search tool
#[derive(Debug, Clone)]
pub struct SerperConfig {
    /// serper.dev API key
    pub api_key: String,
    /// Number of results to request
    pub num_results: usize,
    /// Endpoint override (tests point this at a local server)
    pub endpoint: String,
}

impl SerperConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            num_results: DEFAULT_NUM_RESULTS,
            endpoint: SERPER_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

/// A single organic search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganicResult {
    /// Result title
    #[serde(default)]
    pub title: String,
    /// Result URL
    pub link: String,
    /// Result snippet
    #[serde(default)]
    pub snippet: String,
    /// Position in the result page
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// Web search tool backed by the serper.dev API.
///
/// Returns structured organic results (title, link, snippet) for a query.
/// The raw results include aggregator search pages and PDFs; agents that
/// need direct job postings should use `search_and_filter` instead.
pub struct SerperSearchTool {
    definition: ToolDefinition,
    config: SerperConfig,
    client: reqwest::Client,
}

impl SerperSearchTool {
    /// Create a new Serper search tool
    pub fn new(config: SerperConfig) -> Result<Self> {
        let definition = ToolDefinition::new(
            "serper_search",
            "Search the web via the Serper API. Returns structured organic results \
             with titles, URLs, and snippets. Use for finding job postings, company \
             reviews, and other up-to-date information.",
        )
        .with_category(ToolCategory::Search)
        .with_risk_level(RiskLevel::Low)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (1-100)"
                }
            },
            "required": ["query"]
        }));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            definition,
            config,
            client,
        })
    }

    /// Run the search and return the parsed organic results.
    pub async fn search(&self, query: &str, num_results: usize) -> Result<Vec<OrganicResult>> {
        if self.config.api_key.is_empty() {
            return Err(Error::Execution("SERPER_API_KEY is not set".to_string()));
        }

        let request = SerperRequest {
            q: query,
            num: num_results.clamp(1, MAX_RESULTS_CAP),
        };

        debug!(query = %query, num = request.num, "Sending Serper search request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Serper request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Serper API returned an error");
            return Err(Error::Network(format!(
                "Serper API error: HTTP {}",
                status.as_u16()
            )));
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse Serper response: {}", e)))?;

        debug!(total = body.organic.len(), "Serper search results received");

        Ok(body.organic)
    }
}

#[async_trait::async_trait]
impl Tool for SerperSearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'query' parameter".to_string()))?;

        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let num_results = input
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(self.config.num_results);

        let results = self.search(query, num_results).await?;
        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({
                "query": query,
                "results": results,
                "total": results.len(),
            }),
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> SerperSearchTool {
        SerperSearchTool::new(SerperConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_definition() {
        let tool = tool();
        let def = tool.definition();
        assert_eq!(def.name, "serper_search");
        assert_eq!(def.category, ToolCategory::Search);
    }

    #[test]
    fn test_parse_organic_results() {
        let body = r#"{
            "organic": [
                {"title": "Senior Rust Engineer", "link": "https://example.com/jobs/1", "snippet": "Remote role", "position": 1},
                {"link": "https://example.com/jobs/2"}
            ]
        }"#;

        let parsed: SerperResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "Senior Rust Engineer");
        assert_eq!(parsed.organic[1].title, "");
        assert_eq!(parsed.organic[1].position, None);
    }

    #[test]
    fn test_parse_empty_response() {
        let parsed: SerperResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }

    #[tokio::test]
    async fn test_missing_query() {
        let result = tool().execute(serde_json::json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_query() {
        let result = tool().execute(serde_json::json!({"query": "   "})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let tool = SerperSearchTool::new(SerperConfig::new("")).unwrap();
        let result = tool.search("rust jobs", 10).await;
        assert!(matches!(result, Err(Error::Execution(_))));
    }
}
