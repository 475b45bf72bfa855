//! CLI commands for the jobscout pipeline

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jobscout_core::{AgentLibrary, Crew, CrewConfig, JobResults, TaskLibrary};
use jobscout_llm::{CompletionRequest, GeminiConfig, GeminiProvider, LlmProvider, Message};
use jobscout_tools::{register_builtins, BuiltinsConfig, ToolRegistry};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Repair attempts when the final output fails schema validation
const MAX_VALIDATION_RETRIES: usize = 2;

/// Serper results requested for the initial sweep
const SEARCH_NUM_RESULTS: usize = 100;

/// Jobscout CLI
#[derive(Parser)]
#[command(name = "jobscout", version, about = "Job-search crew pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Run the job-search pipeline
    Run(RunArgs),
    /// Print the output JSON schema
    Schema,
}

/// Arguments for the run command
#[derive(clap::Args)]
pub struct RunArgs {
    /// Job characteristics to search for (prompted interactively when omitted)
    #[arg(long)]
    query: Option<String>,

    /// Path to the resume file used by the rating agent
    #[arg(long, default_value = "data/sample_resume.txt")]
    resume: PathBuf,

    /// Directory containing agents.yml and tasks.yml
    #[arg(long, default_value = "configs")]
    configs: PathBuf,

    /// Gemini model override
    #[arg(long)]
    model: Option<String>,

    /// Enable the relevance-filtering and company-rating stages
    #[arg(long)]
    extended: bool,
}

/// Dispatch a parsed CLI invocation
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run_pipeline(args).await,
        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&JobResults::json_schema())?
            );
            Ok(())
        }
    }
}

/// Agent and task rosters, in execution order
fn roster(extended: bool) -> (Vec<&'static str>, Vec<&'static str>) {
    if extended {
        (
            vec![
                "job_search_expert",
                "job_filtering_expert",
                "job_rating_expert",
                "company_rating_expert",
                "summarization_expert",
            ],
            vec![
                "job_search",
                "filter_jobs",
                "job_rating",
                "evaluate_company",
                "structure_results",
            ],
        )
    } else {
        (
            vec![
                "job_search_expert",
                "job_rating_expert",
                "summarization_expert",
            ],
            vec!["job_search", "job_rating", "structure_results"],
        )
    }
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    let query = match args.query {
        Some(query) => query,
        None => inquire::Text::new(
            "Provide the list of characteristics for the job you are looking for:",
        )
        .prompt()?,
    };
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let mut gemini_config = GeminiConfig::from_env()
        .context("Gemini is not configured (set GEMINI_API_KEY)")?;
    if let Some(model) = args.model {
        gemini_config = gemini_config.with_model(model);
    }
    let provider: Arc<GeminiProvider> = Arc::new(GeminiProvider::new(gemini_config)?);

    let serper_api_key =
        std::env::var("SERPER_API_KEY").context("SERPER_API_KEY is not set")?;

    let mut registry = ToolRegistry::new();
    register_builtins(
        &mut registry,
        &BuiltinsConfig {
            serper_api_key,
            num_results: SEARCH_NUM_RESULTS,
            resume_path: Some(args.resume.clone()),
        },
    )?;
    let registry = Arc::new(registry);

    let agents = AgentLibrary::from_path(args.configs.join("agents.yml"))?;
    let tasks = TaskLibrary::from_path(args.configs.join("tasks.yml"))?;

    let schema = serde_json::to_string_pretty(&JobResults::json_schema())?;
    let mut vars = HashMap::new();
    vars.insert("query", query.clone());
    vars.insert("output_schema", schema.clone());

    let (agent_ids, task_ids) = roster(args.extended);

    let mut builder = Crew::builder()
        .provider(provider.clone())
        .registry(registry)
        .config(CrewConfig::default());
    for id in agent_ids {
        builder = builder.agent(agents.agent(id)?);
    }
    for id in task_ids {
        builder = builder.task(tasks.task(id, &vars)?);
    }
    let crew = builder.build()?;

    info!(query = %query, extended = args.extended, "Starting job search crew");
    let raw = crew.kickoff().await?;

    let validated = validate_with_repair(provider.as_ref(), &raw, &schema).await?;

    println!("{}", serde_json::to_string_pretty(&validated)?);
    Ok(())
}

/// Validate the crew's output, asking the model to repair it on failure.
async fn validate_with_repair(
    provider: &dyn LlmProvider,
    raw: &str,
    schema: &str,
) -> Result<JobResults> {
    let mut output = raw.to_string();

    for attempt in 0..=MAX_VALIDATION_RETRIES {
        match JobResults::validate(&output) {
            Ok(results) => {
                if attempt > 0 {
                    info!(attempt, "Output repaired and validated");
                }
                return Ok(results);
            }
            Err(e) if attempt < MAX_VALIDATION_RETRIES => {
                warn!(attempt, error = %e, "Output validation failed, retrying");
                output = repair_output(provider, &output, schema, &e.to_string()).await?;
            }
            Err(e) => {
                return Err(e).context("output failed validation after retries");
            }
        }
    }

    unreachable!("validation loop always returns")
}

/// Ask the model to rewrite invalid output to match the schema.
async fn repair_output(
    provider: &dyn LlmProvider,
    output: &str,
    schema: &str,
    error: &str,
) -> Result<String> {
    let request = CompletionRequest::new("")
        .with_message(Message::system(
            "You repair malformed JSON so that it conforms to a given schema. \
             Respond with the corrected JSON only, no commentary.",
        ))
        .with_message(Message::user(format!(
            "The following output failed schema validation.\n\n\
             Validation error: {error}\n\nSchema:\n{schema}\n\n\
             Output:\n{output}\n\nReturn only the corrected JSON."
        )))
        .with_temperature(0.0);

    let response = provider.complete(request).await?;
    Ok(response.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscout_llm::{CompletionResponse, ToolCompletionResponse};
    use std::sync::Mutex;

    /// Provider double that replays canned completion texts
    struct RepairProvider {
        responses: Mutex<Vec<String>>,
    }

    impl RepairProvider {
        fn new(mut responses: Vec<&str>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for RepairProvider {
        fn name(&self) -> &str {
            "repair"
        }

        fn supports_tools(&self) -> bool {
            false
        }

        fn available_models(&self) -> Vec<String> {
            vec!["repair".to_string()]
        }

        fn default_model(&self) -> &str {
            "repair"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> jobscout_llm::Result<CompletionResponse> {
            let content = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected repair call");
            Ok(CompletionResponse {
                content,
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "repair".to_string(),
            })
        }

        async fn complete_with_tools(
            &self,
            _request: jobscout_llm::ToolCompletionRequest,
        ) -> jobscout_llm::Result<ToolCompletionResponse> {
            unimplemented!("repair provider has no tools")
        }
    }

    #[tokio::test]
    async fn test_validate_passes_valid_output_untouched() {
        let provider = RepairProvider::new(vec![]);
        let raw = r#"{"jobs": [{"title": "Engineer"}]}"#;

        let results = validate_with_repair(&provider, raw, "{}").await.unwrap();
        assert_eq!(results.jobs.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_repairs_invalid_output() {
        let provider = RepairProvider::new(vec![r#"{"jobs": []}"#]);

        let results = validate_with_repair(&provider, "not json at all", "{}")
            .await
            .unwrap();
        assert_eq!(results.jobs.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_validate_gives_up_after_retries() {
        let provider = RepairProvider::new(vec!["still broken", "yet more garbage"]);

        let result = validate_with_repair(&provider, "not json", "{}").await;
        assert!(result.is_err());
        // Both repair attempts were consumed
        assert!(provider.responses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_roster_default() {
        let (agents, tasks) = roster(false);
        assert_eq!(agents.len(), 3);
        assert_eq!(
            tasks,
            vec!["job_search", "job_rating", "structure_results"]
        );
    }

    #[test]
    fn test_roster_extended() {
        let (agents, tasks) = roster(true);
        assert_eq!(agents.len(), 5);
        assert_eq!(tasks.len(), 5);
        assert!(tasks.contains(&"filter_jobs"));
        assert!(tasks.contains(&"evaluate_company"));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["jobscout", "run", "--query", "remote rust", "--extended"]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.query.as_deref(), Some("remote rust"));
                assert!(args.extended);
                assert_eq!(args.configs, PathBuf::from("configs"));
            }
            Command::Schema => panic!("expected run command"),
        }
    }
}
