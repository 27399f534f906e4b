use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::server::error::ApiResult;
use crate::server::state::AppState;

fn content_type(key: &str) -> &'static str {
    match key.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()).as_deref() {
        Some("srt") => "application/x-subrip; charset=utf-8",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Download a stored artifact by key
#[tracing::instrument(skip(state))]
pub async fn file_handler(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<Response> {
    let data = state.context.artifacts.get(&key).await?;
    let file_name = key.rsplit('/').next().unwrap_or("download").to_string();
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&key).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        data,
    )
        .into_response())
}
