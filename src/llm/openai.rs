//! OpenAI-compatible chat completions client
//!
//! Talks to any server exposing `POST {api_base}/chat/completions`, which
//! includes Ollama's `/v1` endpoint, llama.cpp server, vLLM and OpenAI itself.

use crate::llm::client::{ChatMessage, LLMClient, LLMResponse, Role};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAIClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Value {
        let wire_messages: Vec<WireMessage> = messages.iter().map(WireMessage::from).collect();

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
            "temperature": self.temperature,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if !tools.is_empty() {
            let wire_tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(wire_tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }
}

/// Map a transport failure to the error kinds callers distinguish
fn classify_send_error(e: reqwest::Error) -> AppError {
    if e.is_connect() || e.is_timeout() {
        AppError::UnreachableEndpoint(e.to_string())
    } else if e.is_decode() || e.is_body() {
        AppError::MalformedResponse(e.to_string())
    } else {
        AppError::UnreachableEndpoint(e.to_string())
    }
}

/// Parse a raw completion body into an [`LLMResponse`]
pub(crate) fn parse_completion(body: &str) -> Result<LLMResponse> {
    let completion: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MalformedResponse(format!("invalid completion payload: {}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::MalformedResponse("completion has no choices".to_string()))?;

    let content = choice.message.content.unwrap_or_default();
    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: parse_arguments(&call.function.arguments),
        })
        .collect();

    if content.trim().is_empty() && tool_calls.is_empty() {
        return Err(AppError::MalformedResponse(
            "completion contains neither text nor tool calls".to_string(),
        ));
    }

    Ok(LLMResponse {
        content,
        tool_calls,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Tool arguments arrive as a JSON-encoded string. Text that does not parse
/// is kept verbatim as a string value so the agent can report the error.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let body = self.build_body(messages, tools);

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::MalformedResponse(format!("unreadable body: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::LLM(format!(
                "{} returned {}: {}",
                self.endpoint, status, text
            )));
        }

        parse_completion(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Wire Types =============

#[derive(Debug, Serialize)]
struct WireMessage {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        // Assistant turns that only carry tool calls send a null content
        let content = if msg.role == Role::Assistant
            && msg.content.is_empty()
            && !msg.tool_calls.is_empty()
        {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: msg.role,
            content,
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: match &call.arguments {
                            Value::String(raw) => raw.clone(),
                            other => other.to_string(),
                        },
                    },
                })
                .collect(),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_type")]
    kind: String,
    function: WireFunction,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}
