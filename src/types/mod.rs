use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pipeline::{RunRecord, RunState, TaskOutput};

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchRequest {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchResponse {
    pub run_id: String,
    pub topic: String,
    pub final_markdown: String,
    pub log: String,
    pub tasks: Vec<TaskOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub duration_ms: u64,
}

impl From<RunRecord> for ResearchResponse {
    fn from(record: RunRecord) -> Self {
        let duration_ms = record.duration_ms();
        Self {
            run_id: record.run_id.to_string(),
            topic: record.topic,
            final_markdown: record.final_markdown,
            log: record.log,
            tasks: record.task_outputs,
            output_file: record
                .output_file
                .map(|path| path.to_string_lossy().into_owned()),
            duration_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub state: RunState,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PipelineInfo {
    pub agents: Vec<AgentInfo>,
    pub tasks: Vec<TaskInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentInfo {
    pub name: String,
    pub role: String,
    pub tools: Vec<String>,
    pub allow_delegation: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    pub name: String,
    pub agent: String,
    pub context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One ranked web search hit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please enter a topic before starting the research.")]
    MissingTopic,

    #[error("LLM endpoint unreachable: {0}")]
    UnreachableEndpoint(String),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<AppError>,
        /// Run log captured up to the failure
        log: String,
    },

    #[error("A research run is already in progress")]
    RunInProgress,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error came from one of the external HTTP collaborators
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UnreachableEndpoint(_)
                | AppError::MalformedResponse(_)
                | AppError::LLM(_)
                | AppError::SearchUnavailable(_)
                | AppError::FetchFailed(_)
        )
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::MissingTopic | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::RunInProgress => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::TaskFailed { task, log, .. } => serde_json::json!({
                "error": self.to_string(),
                "task": task,
                "log": log,
            }),
            _ => serde_json::json!({
                "error": self.to_string()
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
