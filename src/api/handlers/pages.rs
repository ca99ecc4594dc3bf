//! HTML page and download handlers

use crate::types::{AppError, Result};
use crate::web::page::SUCCESS_MESSAGE;
use crate::web::{Notice, ResearchPage};
use crate::AppState;
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResearchForm {
    #[serde(default)]
    pub topic: String,
}

/// The research page
pub async fn index() -> Html<String> {
    Html(ResearchPage::new().render())
}

/// Run the pipeline for the submitted topic and render the result page
pub async fn submit(State(state): State<AppState>, Form(form): Form<ResearchForm>) -> Response {
    let page = ResearchPage::new().with_topic(form.topic.clone());

    match state.runner.run_detached(form.topic).await {
        Ok(record) => {
            let mut page = page
                .with_notice(Notice::Success(SUCCESS_MESSAGE.to_string()))
                .with_log(record.log)
                .with_markdown(&record.final_markdown);
            if record.output_file.is_some() {
                page = page.with_download("/download", state.config.output.download_name.clone());
            }
            Html(page.render()).into_response()
        }
        Err(AppError::MissingTopic) => (
            StatusCode::BAD_REQUEST,
            Html(
                page.with_notice(Notice::Warning(AppError::MissingTopic.to_string()))
                    .render(),
            ),
        )
            .into_response(),
        Err(AppError::RunInProgress) => (
            StatusCode::CONFLICT,
            Html(
                page.with_notice(Notice::Warning(
                    "Another research run is in progress. Please try again when it has finished."
                        .to_string(),
                ))
                .render(),
            ),
        )
            .into_response(),
        Err(AppError::TaskFailed { task, source, log }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(
                page.with_notice(Notice::Error(format!(
                    "Research stopped at task '{}': {}",
                    task, source
                )))
                .with_log(log)
                .render(),
            ),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(page.with_notice(Notice::Error(e.to_string())).render()),
        )
            .into_response(),
    }
}

/// Serve the notes written by the last task
pub async fn download(State(state): State<AppState>) -> Result<Response> {
    let path = state
        .runner
        .final_output_file()
        .ok_or_else(|| AppError::NotFound("The pipeline does not write an output file".to_string()))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound("No notes have been written yet".to_string())
        } else {
            AppError::Internal(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&state.config.output.download_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn attachment_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '"' | '\\' | '/'))
        .collect();
    if cleaned.trim().is_empty() {
        "notes.md".to_string()
    } else {
        cleaned
    }
}
