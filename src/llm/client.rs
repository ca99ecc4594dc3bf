//! LLM client abstraction
//!
//! Every backend implements [`LLMClient::chat`]; the simpler prompt helpers
//! are provided on top of it so agents, tests and the CLI can all use the
//! same trait object.

use crate::types::{Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a chat exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by the assistant in this message
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the id of the call being answered
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that asked for tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Result of a tool call, sent back to the model
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
        }
    }
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Send a conversation, optionally advertising tools, and return the reply
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition])
        -> Result<LLMResponse>;

    /// Generate a completion from a single user prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.chat(&[ChatMessage::user(prompt)], &[]).await?;
        Ok(response.content)
    }

    /// Generate a completion with a role/system context
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        let response = self.chat(&messages, &[]).await?;
        Ok(response.content)
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

impl LLMResponse {
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Build the configured client.
///
/// `api_key` is resolved by the caller from the env var named in the config.
pub fn create_client(config: &LlmConfig, api_key: String) -> Result<Arc<dyn LLMClient>> {
    let client = super::openai::OpenAIClient::new(config, api_key)?;
    tracing::info!(
        model = %config.model,
        api_base = %config.api_base,
        "LLM client ready"
    );
    Ok(Arc::new(client))
}
