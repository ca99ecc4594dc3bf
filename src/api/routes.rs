use crate::api::handlers::{pages, pipeline, research};
use crate::AppState;
use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "notecrew",
        description = "Five-agent research pipeline: research, fact check, summarize, organize, take notes"
    ),
    paths(
        research::run_research,
        pipeline::get_pipeline,
        pipeline::get_status,
        pipeline::health,
    ),
    components(schemas(
        crate::types::ResearchRequest,
        crate::types::ResearchResponse,
        crate::types::StatusResponse,
        crate::types::HealthResponse,
        crate::types::PipelineInfo,
        crate::types::AgentInfo,
        crate::types::TaskInfo,
        crate::pipeline::TaskOutput,
        crate::pipeline::RunState,
    )),
    tags(
        (name = "research", description = "Run the pipeline"),
        (name = "pipeline", description = "Pipeline configuration and state"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// JSON API routes, mounted under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/research", post(research::run_research))
        .route("/pipeline", get(pipeline::get_pipeline))
        .route("/status", get(pipeline::get_status))
        .route("/health", get(pipeline::health))
        .route("/openapi.json", get(openapi_json))
}

/// The whole application: page, download and JSON API
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/research", post(pages::submit))
        .route("/download", get(pages::download))
        .nest("/api", create_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
