//! File read tool — local file access for resume content

use crate::error::{Error, Result};
use crate::registry::{RiskLevel, Tool, ToolCategory, ToolDefinition, ToolResult};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Default read cap (1 MiB)
const DEFAULT_MAX_BYTES: usize = 1_048_576;

/// Tool for reading file contents.
///
/// A default path can be bound at construction so agents can read the
/// candidate's resume without knowing where it lives on disk.
pub struct FileReadTool {
    definition: ToolDefinition,
    default_path: Option<PathBuf>,
}

impl FileReadTool {
    /// Create a file read tool with no default path
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_path(None)
    }

    /// Create a file read tool bound to a default path
    #[must_use]
    pub fn with_default_path(default_path: Option<PathBuf>) -> Self {
        let definition = ToolDefinition::new(
            "file_read",
            "Read the contents of a local file. When called without a path, \
             reads the configured resume file.",
        )
        .with_category(ToolCategory::File)
        .with_risk_level(RiskLevel::Low)
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to read (optional when a default is configured)"
                },
                "max_bytes": {
                    "type": "integer",
                    "description": "Maximum bytes to read"
                }
            },
            "required": []
        }));

        Self {
            definition,
            default_path,
        }
    }
}

impl Default for FileReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for FileReadTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let path = match input.get("path").and_then(|v| v.as_str()) {
            Some(p) => PathBuf::from(p),
            None => self.default_path.clone().ok_or_else(|| {
                Error::InvalidInput(
                    "Missing 'path' parameter and no default path configured".to_string(),
                )
            })?,
        };

        let max_bytes = input
            .get("max_bytes")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_MAX_BYTES as u64) as usize;

        debug!(path = %path.display(), max_bytes = %max_bytes, "Reading file");

        let file = tokio::fs::File::open(&path).await.map_err(Error::Io)?;

        let mut contents = Vec::new();
        let mut take = file.take(max_bytes as u64);
        take.read_to_end(&mut contents).await.map_err(Error::Io)?;

        let content = String::from_utf8_lossy(&contents).to_string();
        let truncated = contents.len() >= max_bytes;

        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({
                "content": content,
                "path": path.display().to_string(),
                "size": contents.len(),
                "truncated": truncated
            }),
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Experienced Rust engineer.").unwrap();

        let tool = FileReadTool::new();
        let result = tool
            .execute(serde_json::json!({"path": file.path().to_str().unwrap()}))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output["content"]
            .as_str()
            .unwrap()
            .contains("Experienced Rust engineer."));
        assert_eq!(result.output["truncated"], false);
    }

    #[tokio::test]
    async fn test_read_default_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resume body").unwrap();

        let tool = FileReadTool::with_default_path(Some(file.path().to_path_buf()));
        let result = tool.execute(serde_json::json!({})).await.unwrap();

        assert!(result.success);
        assert!(result.output["content"].as_str().unwrap().contains("resume body"));
    }

    #[tokio::test]
    async fn test_missing_path_and_no_default() {
        let tool = FileReadTool::new();
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_max_bytes_truncates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", "x".repeat(100)).unwrap();

        let tool = FileReadTool::new();
        let result = tool
            .execute(serde_json::json!({
                "path": file.path().to_str().unwrap(),
                "max_bytes": 10
            }))
            .await
            .unwrap();

        assert_eq!(result.output["size"], 10);
        assert_eq!(result.output["truncated"], true);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let tool = FileReadTool::new();
        let result = tool
            .execute(serde_json::json!({"path": "/nonexistent/resume.txt"}))
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
