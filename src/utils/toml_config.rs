//! TOML-based configuration for notecrew
//!
//! A single file (`notecrew.toml`) declares the server, the LLM endpoint, the
//! tools, the agent personas and the ordered task list. The shipped file is
//! compiled in and used whenever no file exists on disk.
//!
//! Secrets never live in the file. Fields ending in `_env` name the
//! environment variable holding the value.

use crate::pipeline::{GraphError, TaskGraph, TaskSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The shipped `notecrew.toml`
pub const DEFAULT_CONFIG: &str = include_str!("../../notecrew.toml");

/// Tool names agents may list in `tools = [...]`
pub const KNOWN_TOOLS: &[&str] = &["web_search", "scrape_website"];

/// Root configuration structure loaded from notecrew.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotecrewConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Agent personas keyed by name
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,

    /// Tasks in execution order
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    pub model: String,

    /// Environment variable containing the API key
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Request timeout. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Serper,
    DuckDuckGo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub backend: SearchBackend,

    /// Environment variable containing the Serper key
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_num_results")]
    pub num_results: usize,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_search_key_env() -> String {
    "SERPER_API_KEY".to_string()
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_num_results() -> usize {
    5
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            api_key_env: default_search_key_env(),
            endpoint: default_search_endpoint(),
            num_results: default_num_results(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    /// Longest page text handed back to the agent
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_chars() -> usize {
    8000
}

fn default_user_agent() -> String {
    concat!("Mozilla/5.0 (compatible; notecrew/", env!("CARGO_PKG_VERSION"), ")").to_string()
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            max_chars: default_max_chars(),
            user_agent: default_user_agent(),
        }
    }
}

// ============= Output Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that task `output_file` paths are relative to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// File name offered to the browser on download
    #[serde(default = "default_download_name")]
    pub download_name: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_download_name() -> String {
    "research_notes.md".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            download_name: default_download_name(),
        }
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub role: String,

    /// Goal template, may contain `{topic}`
    pub goal: String,

    /// Backstory template, may contain `{topic}`
    pub backstory: String,

    /// List of tool names this agent can use
    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub allow_delegation: bool,

    /// Maximum reasoning steps before a final answer is forced
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    10
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnusedAgent,
    UnusedTool,
    NoOutputFile,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Agent '{0}' referenced by task '{1}' does not exist")]
    MissingAgent(String, String),

    #[error("Tool '{0}' referenced by agent '{1}' does not exist")]
    MissingTool(String, String),

    #[error("Agent '{0}' enables delegation, which is not supported")]
    DelegationUnsupported(String),

    #[error("Invalid task pipeline: {0}")]
    InvalidPipeline(#[from] GraphError),
}

impl NotecrewConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `path`, or fall back to the built-in configuration when the
    /// file does not exist. Invalid files are still errors.
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(missing)) => {
                warn!(
                    path = %missing.display(),
                    "Configuration file not found, using built-in defaults"
                );
                Self::builtin()
            }
            other => other,
        }
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: NotecrewConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The shipped five-agent research crew
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Validate internal consistency: tool and agent references, delegation
    /// and the task graph. Environment variables are checked separately by
    /// [`validate_env`](Self::validate_env).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".to_string(),
            ));
        }
        if self.llm.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.api_base must not be empty".to_string(),
            ));
        }

        for (agent_name, agent_config) in &self.agents {
            if agent_config.allow_delegation {
                return Err(ConfigError::DelegationUnsupported(agent_name.clone()));
            }

            if agent_config.max_iterations == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "Agent '{}' must allow at least one iteration",
                    agent_name
                )));
            }

            for tool_name in &agent_config.tools {
                if !KNOWN_TOOLS.contains(&tool_name.as_str()) {
                    return Err(ConfigError::MissingTool(
                        tool_name.clone(),
                        agent_name.clone(),
                    ));
                }
            }
        }

        for task in &self.tasks {
            if !self.agents.contains_key(&task.agent) {
                return Err(ConfigError::MissingAgent(
                    task.agent.clone(),
                    task.name.clone(),
                ));
            }
        }

        self.task_graph()?;

        Ok(())
    }

    /// Check that every referenced environment variable is set
    pub fn validate_env(&self) -> Result<(), ConfigError> {
        self.validate_env_var(&self.llm.api_key_env)?;
        if self.search.backend == SearchBackend::Serper && self.uses_tool("web_search") {
            self.validate_env_var(&self.search.api_key_env)?;
        }
        Ok(())
    }

    /// Validate configuration with warnings for unused items
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(self.check_unused_agents());
        warnings.extend(self.check_unused_tools());

        if self.final_output_file().is_none() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoOutputFile,
                message: "The last task has no output_file, so there is nothing to download"
                    .to_string(),
            });
        }

        Ok(warnings)
    }

    /// Check for agents that aren't assigned to any task
    fn check_unused_agents(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.tasks.iter().map(|t| t.agent.as_str()).collect();

        self.agents
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedAgent,
                message: format!("Agent '{}' is defined but not assigned to any task", name),
            })
            .collect()
    }

    /// Check for tools that no agent can call
    fn check_unused_tools(&self) -> Vec<ConfigWarning> {
        KNOWN_TOOLS
            .iter()
            .filter(|tool| !self.uses_tool(tool))
            .map(|tool| ConfigWarning {
                kind: ConfigWarningKind::UnusedTool,
                message: format!("Tool '{}' is not referenced by any agent", tool),
            })
            .collect()
    }

    fn uses_tool(&self, name: &str) -> bool {
        self.agents
            .values()
            .any(|a| a.tools.iter().any(|t| t == name))
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get the LLM API key from the environment
    pub fn llm_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.llm.api_key_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.llm.api_key_env.clone()))
    }

    /// Get the search API key from the environment, if set
    pub fn search_api_key(&self) -> Option<String> {
        self.resolve_env(&self.search.api_key_env)
            .filter(|key| !key.trim().is_empty())
    }

    /// Get agent by name
    pub fn get_agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    /// Build the validated task graph
    pub fn task_graph(&self) -> Result<TaskGraph, ConfigError> {
        Ok(TaskGraph::new(self.tasks.clone())?)
    }

    /// Resolve a task output file against the output directory
    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output.dir.join(file)
    }

    /// Where the last task writes its result, if anywhere
    pub fn final_output_file(&self) -> Option<PathBuf> {
        self.tasks
            .last()
            .and_then(|task| task.output_file.as_deref())
            .map(|file| self.output_path(file))
    }
}
