use crate::{
    types::{ResearchRequest, ResearchResponse, Result},
    AppState,
};
use axum::{extract::State, Json};

/// Run the research pipeline for a topic
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research completed", body = ResearchResponse),
        (status = 400, description = "Empty topic"),
        (status = 409, description = "Another run is in progress"),
        (status = 500, description = "A task failed; the body carries the task and the partial log")
    ),
    tag = "research"
)]
pub async fn run_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>> {
    let record = state.runner.run_detached(payload.topic).await?;
    Ok(Json(record.into()))
}
