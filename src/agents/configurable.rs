//! Configurable Agent implementation
//!
//! A persona (role, goal, backstory) from `[agents.<name>]` bound to the shared
//! LLM client and the tools it is permitted to use. Each task runs a
//! reason-act loop: the model either answers or asks for tool calls, whose
//! results are fed back until it answers or the step budget runs out.

use crate::agents::{Agent, TaskRequest};
use crate::llm::{ChatMessage, LLMClient};
use crate::pipeline::{render, LogKind, RunLog, TemplateInputs};
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::AgentConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const FINAL_ANSWER_PROMPT: &str = "You have used all of your allowed steps. \
Do not call any more tools. Give your best Final Answer now, based on what you have gathered.";

/// Longest tool output copied into the run log
const LOG_PREVIEW_CHARS: usize = 1000;

/// A configurable agent that derives its behavior from TOML configuration
pub struct ConfigurableAgent {
    name: String,
    role: String,
    goal: String,
    backstory: String,
    llm: Arc<dyn LLMClient>,
    tool_registry: Option<Arc<ToolRegistry>>,
    /// List of tool names this agent is allowed to use
    allowed_tools: Vec<String>,
    max_iterations: usize,
}

impl ConfigurableAgent {
    /// Create a new configurable agent from TOML config
    ///
    /// Delegation is not supported and is rejected here as well as during
    /// configuration validation.
    pub fn new(
        name: &str,
        config: &AgentConfig,
        llm: Arc<dyn LLMClient>,
        tool_registry: Option<Arc<ToolRegistry>>,
    ) -> Result<Self> {
        if config.allow_delegation {
            return Err(AppError::Configuration(format!(
                "Agent '{}' enables delegation, which is not supported",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            role: config.role.clone(),
            goal: config.goal.clone(),
            backstory: config.backstory.clone(),
            llm,
            tool_registry,
            allowed_tools: config.tools.clone(),
            max_iterations: config.max_iterations.max(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Get the list of allowed tool names for this agent
    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }

    /// Check if this agent has tools configured
    pub fn has_tools(&self) -> bool {
        !self.allowed_tools.is_empty() && self.tool_registry.is_some()
    }

    /// Persona prompt with the run's inputs substituted
    pub fn system_prompt(&self, inputs: &TemplateInputs) -> String {
        let mut prompt = format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role,
            render(&self.backstory, inputs).trim(),
            render(&self.goal, inputs).trim()
        );

        if self.has_tools() {
            prompt.push_str(
                "\nYou can call the tools you are given to look things up. \
                 When you have enough information, reply with your final answer and no tool calls.",
            );
        }

        prompt
    }

    /// Get tool definitions for only this agent's allowed tools
    pub fn get_filtered_tool_definitions(&self) -> Vec<ToolDefinition> {
        match &self.tool_registry {
            Some(registry) => {
                let allowed: Vec<&str> = self.allowed_tools.iter().map(|s| s.as_str()).collect();
                registry.get_tool_definitions_for(&allowed)
            }
            None => Vec::new(),
        }
    }

    /// Check if a specific tool is allowed for this agent
    pub fn can_use_tool(&self, tool_name: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == tool_name)
            && self
                .tool_registry
                .as_ref()
                .map(|r| r.has_tool(tool_name))
                .unwrap_or(false)
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<Value> {
        if !self.can_use_tool(&call.name) {
            return Err(AppError::InvalidInput(format!(
                "Tool '{}' is not available to {}. Available tools: [{}]",
                call.name,
                self.role,
                self.allowed_tools.join(", ")
            )));
        }

        let arguments = tool_arguments(call)?;
        match &self.tool_registry {
            Some(registry) => registry.execute(&call.name, arguments).await,
            None => Err(AppError::NotFound(format!("Tool not found: {}", call.name))),
        }
    }
}

/// Tool arguments must be a JSON object. A string is what the client kept
/// when the model's argument text did not parse.
fn tool_arguments(call: &ToolCall) -> Result<Value> {
    let invalid = |detail: String| {
        AppError::InvalidInput(format!("invalid arguments for {}: {}", call.name, detail))
    };

    match &call.arguments {
        Value::Object(_) => Ok(call.arguments.clone()),
        Value::Null => Ok(json!({})),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(other) => Err(invalid(format!("expected a JSON object, got {}", other))),
            Err(e) => Err(invalid(e.to_string())),
        },
        other => Err(invalid(format!("expected a JSON object, got {}", other))),
    }
}

#[async_trait]
impl Agent for ConfigurableAgent {
    fn role(&self) -> &str {
        &self.role
    }

    async fn run(&self, request: &TaskRequest, log: &RunLog) -> Result<String> {
        let tools = self.get_filtered_tool_definitions();
        let mut messages = vec![
            ChatMessage::system(self.system_prompt(&request.inputs)),
            ChatMessage::user(request.prompt()),
        ];

        log.record(&self.role, LogKind::Task, request.description.trim());

        for iteration in 1..=self.max_iterations {
            tracing::debug!(agent = %self.name, iteration, "Agent step");

            let response = self.llm.chat(&messages, &tools).await?;

            if !response.wants_tools() {
                log.record(&self.role, LogKind::Answer, response.content.clone());
                return Ok(response.content);
            }

            if !response.content.trim().is_empty() {
                log.record(&self.role, LogKind::Thought, response.content.trim());
            }

            messages.push(ChatMessage::assistant_with_tools(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                log.record(
                    &self.role,
                    LogKind::ToolCall,
                    format!("{} {}", call.name, call.arguments),
                );

                // Tool failures go back to the model; they never end the task
                let content = match self.call_tool(call).await {
                    Ok(value) => {
                        let text = value.to_string();
                        log.record(&self.role, LogKind::ToolResult, clip(&text, LOG_PREVIEW_CHARS));
                        text
                    }
                    Err(e) => {
                        tracing::warn!(agent = %self.name, tool = %call.name, error = %e, "Tool call failed");
                        log.record(&self.role, LogKind::ToolError, e.to_string());
                        json!({ "error": e.to_string() }).to_string()
                    }
                };

                messages.push(ChatMessage::tool(call.id.clone(), content));
            }
        }

        log.record(
            &self.role,
            LogKind::Thought,
            format!(
                "Reached the limit of {} steps, asking for a final answer",
                self.max_iterations
            ),
        );
        messages.push(ChatMessage::user(FINAL_ANSWER_PROMPT));

        let response = self.llm.chat(&messages, &[]).await?;
        if response.content.trim().is_empty() {
            return Err(AppError::LLM(format!(
                "{} did not produce a final answer",
                self.role
            )));
        }

        log.record(&self.role, LogKind::Answer, response.content.clone());
        Ok(response.content)
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;
    use crate::pipeline::topic_inputs;
    use crate::tools::registry::Tool;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned responses and records what it was sent
    struct ScriptedLLM {
        replies: Mutex<VecDeque<LLMResponse>>,
        seen_tools: Mutex<Vec<usize>>,
        seen_messages: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLLM {
        fn new(replies: Vec<LLMResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen_tools: Mutex::new(vec![]),
                seen_messages: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedLLM {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            tools: &[ToolDefinition],
        ) -> Result<LLMResponse> {
            self.seen_tools.lock().push(tools.len());
            self.seen_messages.lock().push(messages.to_vec());
            self.replies
                .lock()
                .pop_front()
                .ok_or_else(|| AppError::LLM("script exhausted".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "web_search"
        }

        fn description(&self) -> &str {
            "Echo the query"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, args: Value) -> Result<Value> {
            match args.get("query").and_then(|q| q.as_str()) {
                Some("fail") => Err(AppError::SearchUnavailable("quota exceeded".to_string())),
                Some(q) => Ok(json!({ "results": [q] })),
                None => Err(AppError::InvalidInput("Missing 'query' parameter".to_string())),
            }
        }
    }

    fn text(content: &str) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        }
    }

    fn tool_call(name: &str, args: Value) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            finish_reason: "tool_calls".to_string(),
        }
    }

    fn config(tools: &[&str], max_iterations: usize) -> AgentConfig {
        AgentConfig {
            role: "Researcher".to_string(),
            goal: "Gather information on {topic}".to_string(),
            backstory: "You research {topic}.".to_string(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            allow_delegation: false,
            max_iterations,
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        Arc::new(registry)
    }

    fn request() -> TaskRequest {
        TaskRequest {
            task: "research".to_string(),
            description: "Research quantum computing".to_string(),
            expected_output: "Notes".to_string(),
            inputs: topic_inputs("quantum computing"),
            context: vec![],
        }
    }

    #[test]
    fn test_system_prompt_renders_topic() {
        let llm = ScriptedLLM::new(vec![]);
        let agent = ConfigurableAgent::new("researcher", &config(&[], 3), llm, None).unwrap();
        let prompt = agent.system_prompt(&topic_inputs("qubits"));
        assert!(prompt.starts_with("You are Researcher. You research qubits."));
        assert!(prompt.contains("Your personal goal is: Gather information on qubits"));
    }

    #[test]
    fn test_step_budget_is_at_least_one() {
        let agent =
            ConfigurableAgent::new("researcher", &config(&["web_search"], 0), ScriptedLLM::new(vec![]), None)
                .unwrap();
        assert_eq!(agent.name(), "researcher");
        assert_eq!(agent.max_iterations(), 1);
        assert_eq!(agent.allowed_tools(), ["web_search".to_string()]);
        assert!(!agent.allows_delegation());
    }

    #[test]
    fn test_delegation_rejected() {
        let mut cfg = config(&[], 3);
        cfg.allow_delegation = true;
        let result = ConfigurableAgent::new("researcher", &cfg, ScriptedLLM::new(vec![]), None);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_has_tools_requires_both_config_and_registry() {
        let agent =
            ConfigurableAgent::new("r", &config(&["web_search"], 3), ScriptedLLM::new(vec![]), None)
                .unwrap();
        assert!(!agent.has_tools());

        let agent = ConfigurableAgent::new("r", &config(&[], 3), ScriptedLLM::new(vec![]), Some(registry()))
            .unwrap();
        assert!(!agent.has_tools());
        assert!(agent.get_filtered_tool_definitions().is_empty());
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let llm = ScriptedLLM::new(vec![text("Qubits are two-level systems.")]);
        let agent = ConfigurableAgent::new("r", &config(&[], 3), llm.clone(), None).unwrap();
        let log = RunLog::new();

        let answer = agent.run(&request(), &log).await.unwrap();
        assert_eq!(answer, "Qubits are two-level systems.");
        assert_eq!(*llm.seen_tools.lock(), vec![0]);
        assert!(log.render().contains("Final Answer: Qubits are two-level systems."));
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let llm = ScriptedLLM::new(vec![
            tool_call("web_search", json!({"query": "qubits"})),
            text("Found it."),
        ]);
        let agent =
            ConfigurableAgent::new("r", &config(&["web_search"], 3), llm.clone(), Some(registry()))
                .unwrap();
        let log = RunLog::new();

        let answer = agent.run(&request(), &log).await.unwrap();
        assert_eq!(answer, "Found it.");
        assert_eq!(*llm.seen_tools.lock(), vec![1, 1]);

        let seen = llm.seen_messages.lock();
        let tool_msg = seen[1].last().unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.contains("qubits"));

        let kinds: Vec<LogKind> = log.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![LogKind::Task, LogKind::ToolCall, LogKind::ToolResult, LogKind::Answer]
        );
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported_to_model() {
        let llm = ScriptedLLM::new(vec![
            tool_call("web_search", json!({"query": "fail"})),
            text("Search was down, answering from memory."),
        ]);
        let agent =
            ConfigurableAgent::new("r", &config(&["web_search"], 3), llm.clone(), Some(registry()))
                .unwrap();
        let log = RunLog::new();

        let answer = agent.run(&request(), &log).await.unwrap();
        assert!(answer.starts_with("Search was down"));

        let seen = llm.seen_messages.lock();
        assert!(seen[1].last().unwrap().content.contains("quota exceeded"));
        assert!(log.entries().iter().any(|e| e.kind == LogKind::ToolError));
    }

    #[tokio::test]
    async fn test_unpermitted_tool_is_never_executed() {
        let llm = ScriptedLLM::new(vec![
            tool_call("web_search", json!({"query": "qubits"})),
            text("Done without tools."),
        ]);
        // Registry has the tool, but this agent is not allowed to use it
        let agent = ConfigurableAgent::new("r", &config(&[], 3), llm.clone(), Some(registry())).unwrap();
        let log = RunLog::new();

        agent.run(&request(), &log).await.unwrap();

        let seen = llm.seen_messages.lock();
        assert!(seen[1].last().unwrap().content.contains("not available"));
        assert!(!log.entries().iter().any(|e| e.kind == LogKind::ToolResult));
    }

    #[tokio::test]
    async fn test_unparsable_arguments_are_reported_to_model() {
        let llm = ScriptedLLM::new(vec![
            tool_call("web_search", Value::String(r#"{"query": "qub"#.to_string())),
            text("Answering without search."),
        ]);
        let agent =
            ConfigurableAgent::new("r", &config(&["web_search"], 3), llm.clone(), Some(registry()))
                .unwrap();
        let log = RunLog::new();

        let answer = agent.run(&request(), &log).await.unwrap();
        assert_eq!(answer, "Answering without search.");

        let seen = llm.seen_messages.lock();
        let tool_msg = seen[1].last().unwrap();
        assert!(tool_msg.content.contains("invalid arguments for web_search"));
        assert!(tool_msg.content.contains("EOF"));
        assert!(!log.entries().iter().any(|e| e.kind == LogKind::ToolResult));
        assert!(log.entries().iter().any(|e| e.kind == LogKind::ToolError));
    }

    #[test]
    fn test_tool_arguments_accepts_objects_and_encoded_objects() {
        let call = |arguments: Value| ToolCall {
            id: "c".to_string(),
            name: "web_search".to_string(),
            arguments,
        };

        assert_eq!(
            tool_arguments(&call(json!({"query": "a"}))).unwrap(),
            json!({"query": "a"})
        );
        assert_eq!(
            tool_arguments(&call(Value::String(r#"{"query":"b"}"#.to_string()))).unwrap(),
            json!({"query": "b"})
        );
        assert_eq!(tool_arguments(&call(Value::Null)).unwrap(), json!({}));
        assert!(matches!(
            tool_arguments(&call(json!([1, 2]))),
            Err(AppError::InvalidInput(msg)) if msg.contains("expected a JSON object")
        ));
    }

    #[tokio::test]
    async fn test_step_budget_forces_final_answer() {
        let llm = ScriptedLLM::new(vec![
            tool_call("web_search", json!({"query": "a"})),
            tool_call("web_search", json!({"query": "b"})),
            text("Final after budget."),
        ]);
        let agent =
            ConfigurableAgent::new("r", &config(&["web_search"], 2), llm.clone(), Some(registry()))
                .unwrap();
        let log = RunLog::new();

        let answer = agent.run(&request(), &log).await.unwrap();
        assert_eq!(answer, "Final after budget.");
        // The forced answer is requested without tools
        assert_eq!(*llm.seen_tools.lock(), vec![1, 1, 0]);
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = ScriptedLLM::new(vec![]);
        let agent = ConfigurableAgent::new("r", &config(&[], 3), llm, None).unwrap();
        let result = agent.run(&request(), &RunLog::new()).await;
        assert!(matches!(result, Err(AppError::LLM(_))));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("abcdef", 3), "abc...");
        assert_eq!(clip("abc", 3), "abc");
    }
}
