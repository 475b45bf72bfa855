//! Result Schema
//!
//! The structured output of the pipeline: a list of rated job postings.
//! Field names match the wire format consumed by downstream tooling
//! (note the camelCase `jobProvider`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single rated job posting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Posting identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Job location
    #[serde(default)]
    pub location: Option<String>,
    /// Job title
    #[serde(default)]
    pub title: Option<String>,
    /// Hiring company
    #[serde(default)]
    pub company: Option<String>,
    /// Role description
    #[serde(default)]
    pub description: Option<String>,
    /// Role responsibilities
    #[serde(default)]
    pub responsibilities: Option<String>,
    /// Role requirements
    #[serde(default)]
    pub requirements: Option<String>,
    /// Site the posting was found on
    #[serde(default, rename = "jobProvider")]
    pub job_provider: Option<String>,
    /// Direct posting URL
    #[serde(default)]
    pub url: Option<String>,
    /// Match rating against the resume (1-10)
    #[serde(default)]
    pub rating: Option<i64>,
    /// Why the rating was given
    #[serde(default)]
    pub rating_description: Option<String>,
    /// Company rating (1-10)
    #[serde(default)]
    pub company_rating: Option<i64>,
    /// Why the company rating was given
    #[serde(default)]
    pub company_rating_description: Option<String>,
}

/// Container for the pipeline's final output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    /// The rated postings
    #[serde(default)]
    pub jobs: Option<Vec<Job>>,
}

impl JobResults {
    /// JSON schema handed to the structuring agent as `{output_schema}`
    #[must_use]
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "title": "JobResults",
            "type": "object",
            "properties": {
                "jobs": {
                    "type": "array",
                    "items": {
                        "title": "Job",
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "location": {"type": "string"},
                            "title": {"type": "string"},
                            "company": {"type": "string"},
                            "description": {"type": "string"},
                            "responsibilities": {"type": "string"},
                            "requirements": {"type": "string"},
                            "jobProvider": {"type": "string"},
                            "url": {"type": "string"},
                            "rating": {"type": "integer", "minimum": 1, "maximum": 10},
                            "rating_description": {"type": "string"},
                            "company_rating": {"type": "integer", "minimum": 1, "maximum": 10},
                            "company_rating_description": {"type": "string"}
                        }
                    }
                }
            },
            "required": ["jobs"]
        })
    }

    /// Validate raw LLM output against the schema.
    ///
    /// Models routinely wrap JSON in Markdown code fences; those are
    /// stripped before parsing.
    pub fn validate(raw: &str) -> Result<Self> {
        let cleaned = strip_code_fences(raw);
        serde_json::from_str(cleaned).map_err(|e| Error::Validation(e.to_string()))
    }
}

/// Strip a surrounding Markdown code fence (``` or ```json) if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the fence's language tag line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return trimmed,
    };

    body.strip_suffix("```").map_or(body, str::trim).trim()
}
