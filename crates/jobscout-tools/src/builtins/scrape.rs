//! Website scraping tool — fetch a page and extract its text content

use crate::error::{Error, Result};
use crate::registry::{RiskLevel, Tool, ToolCategory, ToolDefinition, ToolResult};
use jobscout_llm::util::truncate_safe;
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// HTTP timeout for page fetches (seconds)
const SCRAPE_TIMEOUT_SECS: u64 = 30;

/// Maximum bytes of extracted text returned to the agent
const MAX_CONTENT_BYTES: usize = 20_000;

/// User-Agent header to avoid bot blocking
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Blocked hosts for SSRF protection
static BLOCKED_HOSTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "localhost",
        "127.0.0.1",
        "0.0.0.0",
        "::1",
        "[::1]",
        "metadata.google.internal",
        "169.254.169.254", // AWS/GCP metadata
        "metadata.internal",
    ])
});

/// Validate a URL for scraping
fn validate_url(url_str: &str) -> Result<Url> {
    let url =
        Url::parse(url_str).map_err(|e| Error::InvalidInput(format!("Invalid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            warn!(scheme = %scheme, url = %url_str, "Blocked non-HTTP URL scheme");
            return Err(Error::PermissionDenied(format!(
                "URL scheme '{}' is not allowed. Only http/https are permitted.",
                scheme
            )));
        }
    }

    if let Some(host) = url.host_str() {
        let host_lower = host.to_lowercase();

        if BLOCKED_HOSTS.contains(host_lower.as_str()) {
            warn!(host = %host, "Blocked request to internal host");
            return Err(Error::PermissionDenied(format!(
                "Requests to '{}' are blocked for security reasons",
                host
            )));
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                warn!(ip = %ip, "Blocked request to private IP");
                return Err(Error::PermissionDenied(
                    "Requests to private/internal IP addresses are not allowed".to_string(),
                ));
            }
        }

        if host_lower.ends_with(".internal")
            || host_lower.ends_with(".local")
            || host_lower.ends_with(".localhost")
        {
            warn!(host = %host, "Blocked request to internal domain");
            return Err(Error::PermissionDenied(format!(
                "Requests to internal domains like '{}' are not allowed",
                host
            )));
        }
    }

    Ok(url)
}

/// Check if an IP address is private/internal
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => ipv6.is_loopback() || ipv6.is_unspecified(),
    }
}

/// Reduce an HTML page to readable text.
///
/// Drops script/style blocks, strips tags, and decodes common entities.
fn extract_text(html: &str) -> String {
    static SCRIPT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("script regex"));
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex"));

    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    let decoded = without_tags
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ");

    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Fetch a web page and return its text content.
///
/// Used by rating agents to read the body of a job posting found during
/// search. Content is capped to keep prompts bounded.
pub struct ScrapeWebsiteTool {
    definition: ToolDefinition,
    client: reqwest::Client,
}

impl ScrapeWebsiteTool {
    /// Create a new scrape tool
    pub fn new() -> Result<Self> {
        let definition = ToolDefinition::new(
            "scrape_website",
            "Fetch a web page and return its readable text content. \
             Use this to read the details of a specific job posting URL.",
        )
        .with_category(ToolCategory::Http)
        .with_risk_level(RiskLevel::Medium)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the page to fetch"
                }
            },
            "required": ["url"]
        }));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SCRAPE_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { definition, client })
    }
}

#[async_trait::async_trait]
impl Tool for ScrapeWebsiteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let url_str = input
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'url' parameter".to_string()))?;

        let url = validate_url(url_str)?;

        debug!(url = %url, "Fetching page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("Fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::failure(
                format!("HTTP {} fetching {}", status.as_u16(), url),
                start.elapsed().as_millis() as u64,
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read body: {}", e)))?;

        let text = extract_text(&html);
        let truncated = text.len() > MAX_CONTENT_BYTES;
        let content = truncate_safe(&text, MAX_CONTENT_BYTES).to_string();

        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({
                "url": url.as_str(),
                "content": content,
                "truncated": truncated,
            }),
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_schemes() {
        assert!(validate_url("https://example.com/jobs/1").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_validate_url_blocks_internal_hosts() {
        assert!(validate_url("http://localhost/admin").is_err());
        assert!(validate_url("http://127.0.0.1:8080/").is_err());
        assert!(validate_url("http://169.254.169.254/latest/meta-data").is_err());
        assert!(validate_url("http://10.0.0.5/").is_err());
        assert!(validate_url("http://service.internal/").is_err());
    }

    #[test]
    fn test_extract_text_strips_tags_and_scripts() {
        let html = r#"
            <html><head><style>body { color: red; }</style>
            <script>console.log("hi");</script></head>
            <body><h1>Senior Rust Engineer</h1>
            <p>Remote &amp; full-time</p></body></html>
        "#;

        let text = extract_text(html);
        assert!(text.contains("Senior Rust Engineer"));
        assert!(text.contains("Remote & full-time"));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
    }

    #[tokio::test]
    async fn test_missing_url() {
        let tool = ScrapeWebsiteTool::new().unwrap();
        let result = tool.execute(serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
