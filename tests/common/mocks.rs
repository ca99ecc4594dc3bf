//! Mock implementations for testing.
//!
//! Shared by the pipeline and API tests so no test needs a model server or
//! network access.

use notecrew::llm::{ChatMessage, LLMClient, LLMResponse, Role};
use notecrew::tools::{Tool, ToolRegistry};
use notecrew::types::{AppError, Result, ToolCall, ToolDefinition};
use notecrew::utils::toml_config::NotecrewConfig;
use notecrew::PipelineRunner;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Mock LLM client.
///
/// Scripted responses are returned first, in order. After that every call
/// answers `"<role> final answer"`, where the role is read from the persona
/// system prompt. Every conversation it receives is recorded.
#[derive(Default)]
pub struct MockLLMClient {
    script: Mutex<VecDeque<Result<LLMResponse>>>,
    fail_role: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(responses: Vec<Result<LLMResponse>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Every call made on behalf of `role` fails as if the server were down
    pub fn failing_for(role: &str) -> Self {
        Self {
            fail_role: Some(role.to_string()),
            ..Self::default()
        }
    }

    /// Every call waits `delay` before answering
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().clone()
    }

    /// The task prompt of each call, in call order
    pub fn task_prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|messages| {
                messages
                    .iter()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.clone())
            })
            .collect()
    }

    /// The persona role of each call, in call order
    pub fn roles(&self) -> Vec<String> {
        self.calls.lock().iter().map(|m| role_of(m)).collect()
    }
}

fn role_of(messages: &[ChatMessage]) -> String {
    messages
        .first()
        .filter(|m| m.role == Role::System)
        .and_then(|m| m.content.strip_prefix("You are "))
        .and_then(|rest| rest.split('.').next())
        .unwrap_or("Assistant")
        .to_string()
}

pub fn text_response(content: &str) -> LLMResponse {
    LLMResponse {
        content: content.to_string(),
        tool_calls: vec![],
        finish_reason: "stop".to_string(),
    }
}

pub fn tool_call_response(id: &str, name: &str, arguments: Value) -> LLMResponse {
    LLMResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.calls.lock().push(messages.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let role = role_of(messages);

        if self.fail_role.as_deref() == Some(role.as_str()) {
            return Err(AppError::UnreachableEndpoint(
                "connection refused".to_string(),
            ));
        }

        if let Some(scripted) = self.script.lock().pop_front() {
            return scripted;
        }

        Ok(text_response(&format!("{} final answer", role)))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// A tool that returns a fixed value or a fixed error
pub struct StubTool {
    name: String,
    result: std::result::Result<Value, String>,
    calls: Mutex<Vec<Value>>,
}

impl StubTool {
    pub fn ok(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            result: Ok(value),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Stub tool"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        self.calls.lock().push(args);
        match &self.result {
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(AppError::SearchUnavailable(message.clone())),
        }
    }
}

/// Tool registry with working stub search and scrape tools
pub fn stub_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(StubTool::ok(
        "web_search",
        json!({"results": [{"title": "Stub", "url": "https://example.com", "snippet": "stub"}]}),
    )));
    registry.register(Arc::new(StubTool::ok(
        "scrape_website",
        json!({"url": "https://example.com", "content": "stub page"}),
    )));
    registry
}

/// The built-in crew writing its output under `dir`
pub fn test_config(dir: &Path) -> NotecrewConfig {
    let mut config = NotecrewConfig::builtin().expect("built-in config is valid");
    config.output.dir = dir.to_path_buf();
    config
}

/// A runner over the built-in crew backed by `llm` and `tools`
pub fn test_runner(
    dir: &Path,
    llm: Arc<MockLLMClient>,
    tools: ToolRegistry,
) -> (NotecrewConfig, PipelineRunner) {
    let config = test_config(dir);
    let runner = PipelineRunner::from_config(&config, llm, Arc::new(tools))
        .expect("runner builds from the built-in config");
    (config, runner)
}
