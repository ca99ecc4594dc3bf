//! Pipeline introspection and health handlers

use crate::{
    types::{AgentInfo, HealthResponse, PipelineInfo, StatusResponse, TaskInfo},
    AppState,
};
use axum::{extract::State, Json};

/// Describe the configured agents and tasks
#[utoipa::path(
    get,
    path = "/api/pipeline",
    responses(
        (status = 200, description = "Configured agents and tasks in execution order", body = PipelineInfo)
    ),
    tag = "pipeline"
)]
pub async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineInfo> {
    let agents = state
        .config
        .agents
        .iter()
        .map(|(name, agent)| AgentInfo {
            name: name.clone(),
            role: agent.role.clone(),
            tools: agent.tools.clone(),
            allow_delegation: agent.allow_delegation,
        })
        .collect();

    let tasks = state
        .runner
        .tasks()
        .iter()
        .map(|task| TaskInfo {
            name: task.name.clone(),
            agent: task.agent.clone(),
            context: task.context.clone(),
            output_file: task.output_file.clone(),
        })
        .collect();

    Json(PipelineInfo { agents, tasks })
}

/// Current runner state
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Runner state", body = StatusResponse)
    ),
    tag = "pipeline"
)]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        state: state.runner.state(),
        model: state.config.llm.model.clone(),
    })
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
