//! Crew - sequential task execution
//!
//! A crew is an ordered list of tasks, each bound to an agent. Tasks run
//! one after another; every task sees the outputs of the tasks before it.
//! Agents with tools run a bounded function-calling loop against the
//! tool registry.

use crate::agents::Agent;
use crate::error::{Error, Result};
use crate::tasks::Task;
use jobscout_llm::{
    CompletionRequest, LlmProvider, Message, ToolCompletionRequest,
};
use jobscout_tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Crew execution settings
#[derive(Debug, Clone)]
pub struct CrewConfig {
    /// Model override (empty = provider default)
    pub model: String,
    /// Sampling temperature (0 keeps the pipeline deterministic)
    pub temperature: f32,
    /// Cap on tool-calling rounds per task
    pub max_tool_iterations: usize,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.0,
            max_tool_iterations: 8,
        }
    }
}

/// A sequential crew of agents and tasks
pub struct Crew {
    agents: HashMap<String, Agent>,
    tasks: Vec<Task>,
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    config: CrewConfig,
}

impl Crew {
    /// Start building a crew
    #[must_use]
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    /// Run all tasks in order and return the final task's output
    pub async fn kickoff(&self) -> Result<String> {
        let mut context: Vec<String> = Vec::new();
        let mut output = String::new();

        for task in &self.tasks {
            let agent = self
                .agents
                .get(&task.spec.agent)
                .ok_or_else(|| Error::AgentNotFound(task.spec.agent.clone()))?;

            let start = Instant::now();
            info!(task = %task.id, agent = %agent.id, "Executing task");

            output = self.execute_task(task, agent, &context).await?;

            debug!(
                task = %task.id,
                duration_ms = start.elapsed().as_millis() as u64,
                output_len = output.len(),
                "Task complete"
            );
            if agent.spec.verbose {
                info!(task = %task.id, output = %output, "Task output");
            }

            context.push(format!("[{}]\n{}", task.id, output));
        }

        Ok(output)
    }

    async fn execute_task(&self, task: &Task, agent: &Agent, context: &[String]) -> Result<String> {
        let messages = vec![
            Message::system(agent.system_prompt()),
            Message::user(task.prompt(context)),
        ];

        if agent.has_tools() && self.provider.supports_tools() {
            self.run_tool_loop(agent, messages).await
        } else {
            let request = CompletionRequest::new(&self.config.model)
                .with_messages(messages)
                .with_temperature(self.config.temperature);

            let response = self.provider.complete(request).await?;
            Ok(response.content)
        }
    }

    /// Function-calling loop: execute requested tools and feed results
    /// back until the model answers in text or the iteration cap hits.
    async fn run_tool_loop(&self, agent: &Agent, mut messages: Vec<Message>) -> Result<String> {
        for name in &agent.spec.tools {
            if !self.registry.has(name) {
                return Err(Error::ToolNotFound(name.clone()));
            }
        }

        let tools = self.registry.to_llm_tools(&agent.spec.tools);

        for _ in 0..self.config.max_tool_iterations {
            let request = CompletionRequest::new(&self.config.model)
                .with_messages(messages.clone())
                .with_temperature(self.config.temperature);

            let response = self
                .provider
                .complete_with_tools(ToolCompletionRequest::new(request, tools.clone()))
                .await?;

            if !response.has_tool_calls() {
                return Ok(response.content.unwrap_or_default());
            }

            messages.push(Message::assistant_with_tools(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let tool = self
                    .registry
                    .get(&call.name)
                    .ok_or_else(|| Error::ToolNotFound(call.name.clone()))?;

                let input: serde_json::Value =
                    serde_json::from_str(&call.arguments).unwrap_or_else(|_| serde_json::json!({}));

                debug!(agent = %agent.id, tool = %call.name, "Executing tool call");

                // Tool failures go back to the model as content so the
                // agent can recover or report them.
                let content = match tool.execute(input).await {
                    Ok(result) => serde_json::to_string(&result.output)
                        .unwrap_or_else(|_| "null".to_string()),
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool execution failed");
                        serde_json::json!({"error": e.to_string()}).to_string()
                    }
                };

                messages.push(Message::tool_response(&call.id, &call.name, content));
            }
        }

        Err(Error::MaxIterations(self.config.max_tool_iterations))
    }
}

/// Builder for [`Crew`]
#[derive(Default)]
pub struct CrewBuilder {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Option<Arc<ToolRegistry>>,
    config: CrewConfig,
}

impl CrewBuilder {
    /// Add an agent
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add a task (tasks run in insertion order)
    #[must_use]
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Set the LLM provider
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    #[must_use]
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set execution settings
    #[must_use]
    pub fn config(mut self, config: CrewConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and build the crew
    pub fn build(self) -> Result<Crew> {
        let provider = self
            .provider
            .ok_or_else(|| Error::Config("crew has no LLM provider".to_string()))?;
        let registry = self
            .registry
            .ok_or_else(|| Error::Config("crew has no tool registry".to_string()))?;

        if self.tasks.is_empty() {
            return Err(Error::Config("crew has no tasks".to_string()));
        }

        let agents: HashMap<String, Agent> = self
            .agents
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        for task in &self.tasks {
            if !agents.contains_key(&task.spec.agent) {
                return Err(Error::AgentNotFound(task.spec.agent.clone()));
            }
        }

        Ok(Crew {
            agents,
            tasks: self.tasks,
            provider,
            registry,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentSpec;
    use crate::tasks::TaskSpec;
    use jobscout_llm::{
        CompletionResponse, ToolCall, ToolCompletionResponse,
    };
    use jobscout_tools::{Tool, ToolDefinition, ToolResult};
    use std::sync::Mutex;

    /// Provider that replays canned responses and records prompts
    struct ScriptedProvider {
        responses: Mutex<Vec<ToolCompletionResponse>>,
        prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<ToolCompletionResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn text(content: &str) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: Some(content.to_string()),
                tool_calls: vec![],
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: "scripted".to_string(),
            }
        }

        fn tool_call(name: &str, arguments: &str) -> ToolCompletionResponse {
            ToolCompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                }],
                usage: None,
                finish_reason: Some("tool_calls".to_string()),
                model: "scripted".to_string(),
            }
        }

        fn next(&self, messages: &[Message]) -> ToolCompletionResponse {
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Self::text("(exhausted)"))
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn supports_tools(&self) -> bool {
            true
        }

        fn available_models(&self) -> Vec<String> {
            vec!["scripted".to_string()]
        }

        fn default_model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> jobscout_llm::Result<CompletionResponse> {
            let response = self.next(&request.messages);
            Ok(CompletionResponse {
                content: response.content.unwrap_or_default(),
                usage: None,
                finish_reason: response.finish_reason,
                model: response.model,
            })
        }

        async fn complete_with_tools(
            &self,
            request: ToolCompletionRequest,
        ) -> jobscout_llm::Result<ToolCompletionResponse> {
            Ok(self.next(&request.request.messages))
        }
    }

    struct EchoTool {
        definition: ToolDefinition,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                definition: ToolDefinition::new("echo", "Echoes its input"),
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn execute(&self, input: serde_json::Value) -> jobscout_tools::Result<ToolResult> {
            Ok(ToolResult::success(input, 1))
        }
    }

    fn agent(id: &str, tools: Vec<String>) -> Agent {
        Agent {
            id: id.to_string(),
            spec: AgentSpec {
                role: format!("{} role", id),
                goal: "test".to_string(),
                backstory: "test".to_string(),
                verbose: false,
                tools,
            },
        }
    }

    fn task(id: &str, agent: &str) -> Task {
        Task {
            id: id.to_string(),
            spec: TaskSpec {
                description: format!("do {}", id),
                expected_output: String::new(),
                agent: agent.to_string(),
            },
        }
    }

    fn registry_with_echo() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new()));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_sequential_context_passing() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::text("first output"),
            ScriptedProvider::text("second output"),
        ]));

        let crew = Crew::builder()
            .agent(agent("a", vec![]))
            .agent(agent("b", vec![]))
            .task(task("one", "a"))
            .task(task("two", "b"))
            .provider(provider.clone())
            .registry(registry_with_echo())
            .build()
            .unwrap();

        let result = crew.kickoff().await.unwrap();
        assert_eq!(result, "second output");

        // The second task's user prompt carries the first task's output
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        let second_user = &prompts[1][1];
        assert!(second_user.content.contains("first output"));
        assert!(second_user.content.contains("[one]"));
    }

    #[tokio::test]
    async fn test_tool_loop_executes_and_terminates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_call("echo", r#"{"payload": 42}"#),
            ScriptedProvider::text("done with tools"),
        ]));

        let crew = Crew::builder()
            .agent(agent("a", vec!["echo".to_string()]))
            .task(task("one", "a"))
            .provider(provider.clone())
            .registry(registry_with_echo())
            .build()
            .unwrap();

        let result = crew.kickoff().await.unwrap();
        assert_eq!(result, "done with tools");

        // Second round saw the assistant tool call and the tool response
        let prompts = provider.prompts.lock().unwrap();
        let second_round = &prompts[1];
        assert_eq!(second_round.len(), 4);
        assert!(second_round[3].content.contains("42"));
        assert_eq!(second_round[3].name.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn test_tool_loop_iteration_cap() {
        let always_calling: Vec<_> = (0..10)
            .map(|_| ScriptedProvider::tool_call("echo", "{}"))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(always_calling));

        let crew = Crew::builder()
            .agent(agent("a", vec!["echo".to_string()]))
            .task(task("one", "a"))
            .provider(provider)
            .registry(registry_with_echo())
            .config(CrewConfig {
                max_tool_iterations: 3,
                ..CrewConfig::default()
            })
            .build()
            .unwrap();

        let result = crew.kickoff().await;
        assert!(matches!(result, Err(Error::MaxIterations(3))));
    }

    #[tokio::test]
    async fn test_unknown_tool_errors() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text("ok")]));

        let crew = Crew::builder()
            .agent(agent("a", vec!["missing_tool".to_string()]))
            .task(task("one", "a"))
            .provider(provider)
            .registry(registry_with_echo())
            .build()
            .unwrap();

        let result = crew.kickoff().await;
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }

    #[test]
    fn test_builder_rejects_unbound_task_agent() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));

        let result = Crew::builder()
            .agent(agent("a", vec![]))
            .task(task("one", "nonexistent"))
            .provider(provider)
            .registry(registry_with_echo())
            .build();

        assert!(matches!(result, Err(Error::AgentNotFound(_))));
    }

    #[test]
    fn test_builder_requires_tasks() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));

        let result = Crew::builder()
            .agent(agent("a", vec![]))
            .provider(provider)
            .registry(registry_with_echo())
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
