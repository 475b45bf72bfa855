//! Search-and-filter tool — job search with result post-filtering
//!
//! Wraps a search tool and strips entries that are unlikely to be direct
//! job postings: PDF documents and known aggregator search-results pages.

use crate::error::{Error, Result};
use crate::registry::{RiskLevel, Tool, ToolCategory, ToolDefinition, ToolResult};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Known URL patterns for aggregator search-results pages.
static SEARCH_PAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)indeed\.com/q-",
        r"(?i)linkedin\.com/jobs/search",
        r"(?i)glassdoor\.com/Job/jobs\.htm",
        r"(?i)ziprecruiter\.com/jobs-search",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("search page pattern"))
    .collect()
});

/// URL extraction fallback for unstructured search output.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"]+"#).expect("url regex"));

/// Check whether a URL's path ends in `.pdf`.
///
/// Only the path component counts; a `.pdf` inside the query string does
/// not make the link a PDF. Unparseable URLs are not treated as PDFs.
fn is_pdf_link(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => url.path().to_ascii_lowercase().ends_with(".pdf"),
        Err(_) => false,
    }
}

/// Check whether a URL matches a known search-results-page pattern.
fn is_search_page(link: &str) -> bool {
    SEARCH_PAGE_PATTERNS.iter().any(|re| re.is_match(link))
}

/// Extract candidate result records from raw search output.
///
/// Structured output (a JSON array, or an object with a `results` array)
/// is used as-is, preserving titles and snippets. Anything else falls
/// back to regex URL extraction over the textual form, producing records
/// that carry only a `link`.
fn extract_records(raw: &serde_json::Value) -> Vec<serde_json::Value> {
    match raw {
        serde_json::Value::Array(items) => items.clone(),
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(items)) = map.get("results") {
                items.clone()
            } else {
                extract_from_text(&raw.to_string())
            }
        }
        serde_json::Value::String(text) => {
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(serde_json::Value::Array(items)) => items,
                _ => extract_from_text(text),
            }
        }
        other => extract_from_text(&other.to_string()),
    }
}

fn extract_from_text(text: &str) -> Vec<serde_json::Value> {
    URL_REGEX
        .find_iter(text)
        .map(|m| serde_json::json!({"link": m.as_str()}))
        .collect()
}

/// Outcome of a filtering pass
#[derive(Debug, Default)]
struct FilterStats {
    kept: Vec<serde_json::Value>,
    removed_pdf: usize,
    removed_search_pages: usize,
    removed_no_link: usize,
}

/// Apply the PDF and search-page filters to a set of records.
fn filter_records(records: Vec<serde_json::Value>) -> FilterStats {
    let mut stats = FilterStats::default();

    for record in records {
        let Some(link) = record.get("link").and_then(|v| v.as_str()) else {
            stats.removed_no_link += 1;
            continue;
        };

        if is_pdf_link(link) {
            debug!(link = %link, "Filtering out PDF");
            stats.removed_pdf += 1;
            continue;
        }

        if is_search_page(link) {
            debug!(link = %link, "Filtering out search-results page");
            stats.removed_search_pages += 1;
            continue;
        }

        stats.kept.push(record);
    }

    stats
}

/// Filtered job search tool.
///
/// Runs the wrapped search tool and returns only results that are likely
/// direct job postings, excluding PDFs and known search-results pages.
/// Search or parsing failures are reported as an error result rather
/// than aborting the pipeline.
pub struct SearchAndFilterTool {
    definition: ToolDefinition,
    search: Arc<dyn Tool>,
}

impl SearchAndFilterTool {
    /// Create a new filter tool wrapping the given search tool
    #[must_use]
    pub fn new(search: Arc<dyn Tool>) -> Self {
        let definition = ToolDefinition::new(
            "search_and_filter",
            "Search for jobs and return structured results (including URLs) \
             pre-filtered to likely be direct job postings, excluding PDFs \
             and known search-results pages.",
        )
        .with_category(ToolCategory::Search)
        .with_risk_level(RiskLevel::Low)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for finding jobs"
                }
            },
            "required": ["query"]
        }));

        Self { definition, search }
    }
}

#[async_trait::async_trait]
impl Tool for SearchAndFilterTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'query' parameter".to_string()))?;

        let raw = match self
            .search
            .execute(serde_json::json!({"query": query}))
            .await
        {
            Ok(result) if result.success => result.output,
            Ok(result) => {
                let message = result.error.unwrap_or_else(|| "search failed".to_string());
                return Ok(ToolResult::failure(
                    format!("Error during search and filtering: {}", message),
                    start.elapsed().as_millis() as u64,
                ));
            }
            Err(e) => {
                return Ok(ToolResult::failure(
                    format!("Error during search and filtering: {}", e),
                    start.elapsed().as_millis() as u64,
                ));
            }
        };

        let records = extract_records(&raw);
        debug!(total = records.len(), "Candidate records before filtering");

        let stats = filter_records(records);
        debug!(
            kept = stats.kept.len(),
            removed_pdf = stats.removed_pdf,
            removed_search_pages = stats.removed_search_pages,
            "Filtering complete"
        );

        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({
                "query": query,
                "results": stats.kept,
                "total": stats.kept.len(),
                "removed_pdf": stats.removed_pdf,
                "removed_search_pages": stats.removed_search_pages,
            }),
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSearchTool {
        definition: ToolDefinition,
        output: serde_json::Value,
    }

    impl StaticSearchTool {
        fn new(output: serde_json::Value) -> Self {
            Self {
                definition: ToolDefinition::new("static_search", "Returns canned output"),
                output,
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for StaticSearchTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
            Ok(ToolResult::success(self.output.clone(), 1))
        }
    }

    struct FailingSearchTool {
        definition: ToolDefinition,
    }

    #[async_trait::async_trait]
    impl Tool for FailingSearchTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, _input: serde_json::Value) -> Result<ToolResult> {
            Err(Error::Network("connection refused".to_string()))
        }
    }

    async fn run_filter(output: serde_json::Value) -> ToolResult {
        let tool = SearchAndFilterTool::new(Arc::new(StaticSearchTool::new(output)));
        tool.execute(serde_json::json!({"query": "rust jobs"}))
            .await
            .unwrap()
    }

    fn kept_links(result: &ToolResult) -> Vec<String> {
        result.output["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["link"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_is_pdf_link() {
        assert!(is_pdf_link("https://example.com/posting.pdf"));
        assert!(is_pdf_link("https://example.com/POSTING.PDF"));
        assert!(is_pdf_link("https://example.com/files/cv.pdf?download=1"));
        // Query-string .pdf does not count
        assert!(!is_pdf_link("https://example.com/view?file=resume.pdf"));
        assert!(!is_pdf_link("https://example.com/jobs/123"));
        // Unparseable URLs are not PDFs
        assert!(!is_pdf_link("not a url"));
    }

    #[test]
    fn test_is_search_page_case_insensitive() {
        assert!(is_search_page("https://www.indeed.com/q-rust-jobs.html"));
        assert!(is_search_page("https://WWW.INDEED.COM/Q-rust-jobs.html"));
        assert!(is_search_page("https://www.linkedin.com/jobs/search?keywords=rust"));
        assert!(is_search_page("https://www.glassdoor.com/Job/jobs.htm?sc=rust"));
        assert!(is_search_page("https://www.ziprecruiter.com/jobs-search?q=rust"));
        assert!(!is_search_page("https://www.linkedin.com/jobs/view/12345"));
        assert!(!is_search_page("https://jobs.example.com/rust-engineer"));
    }

    #[tokio::test]
    async fn test_filters_pdfs_and_search_pages() {
        let result = run_filter(serde_json::json!({
            "results": [
                {"title": "Direct posting", "link": "https://jobs.example.com/rust-engineer"},
                {"title": "PDF flyer", "link": "https://example.com/posting.pdf"},
                {"title": "Indeed search", "link": "https://www.indeed.com/q-rust-jobs.html"},
                {"title": "Another posting", "link": "https://boards.greenhouse.io/acme/jobs/1"}
            ]
        }))
        .await;

        assert!(result.success);
        assert_eq!(
            kept_links(&result),
            vec![
                "https://jobs.example.com/rust-engineer",
                "https://boards.greenhouse.io/acme/jobs/1"
            ]
        );
        assert_eq!(result.output["removed_pdf"], 1);
        assert_eq!(result.output["removed_search_pages"], 1);
    }

    #[tokio::test]
    async fn test_passthrough_preserves_fields_and_order() {
        let result = run_filter(serde_json::json!([
            {"title": "A", "link": "https://a.example.com/job", "snippet": "first"},
            {"title": "B", "link": "https://b.example.com/job", "snippet": "second"}
        ]))
        .await;

        let results = result.output["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["title"], "A");
        assert_eq!(results[0]["snippet"], "first");
        assert_eq!(results[1]["title"], "B");
    }

    #[tokio::test]
    async fn test_regex_fallback_on_text_output() {
        let result = run_filter(serde_json::json!(
            "Found some jobs: https://jobs.example.com/1 and \
             https://example.com/flyer.pdf plus https://www.indeed.com/q-rust.html done"
        ))
        .await;

        assert!(result.success);
        assert_eq!(kept_links(&result), vec!["https://jobs.example.com/1"]);
    }

    #[tokio::test]
    async fn test_string_json_array_is_parsed() {
        let result = run_filter(serde_json::json!(
            r#"[{"title": "Posting", "link": "https://jobs.example.com/1"}]"#
        ))
        .await;

        let results = result.output["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Posting");
    }

    #[tokio::test]
    async fn test_records_without_link_are_dropped() {
        let result = run_filter(serde_json::json!([
            {"title": "No link here"},
            {"link": "https://jobs.example.com/1"}
        ]))
        .await;

        assert_eq!(kept_links(&result), vec!["https://jobs.example.com/1"]);
    }

    #[tokio::test]
    async fn test_search_failure_becomes_error_result() {
        let tool = SearchAndFilterTool::new(Arc::new(FailingSearchTool {
            definition: ToolDefinition::new("failing", "Always fails"),
        }));

        let result = tool
            .execute(serde_json::json!({"query": "rust"}))
            .await
            .unwrap();

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.starts_with("Error during search and filtering:"));
        assert!(error.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_query_is_invalid_input() {
        let tool = SearchAndFilterTool::new(Arc::new(StaticSearchTool::new(serde_json::json!([]))));
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
