use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::{BatchFile, BatchRequest};
use crate::config::AiService;
use crate::model::BatchStatus;
use crate::server::error::{require_user, ApiError, ApiResult};
use crate::server::handlers::UploadForm;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    pub job_id: Option<Uuid>,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status: BatchStatus,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn submit_batch_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let form = UploadForm::read(multipart).await?;
    let user_id = require_user(form.field("userId"))?;
    let target_language = form
        .field("targetLanguage")
        .ok_or_else(|| ApiError::bad_request("targetLanguage is required"))?
        .to_string();
    let source_language = form
        .field("sourceLanguage")
        .filter(|lang| *lang != "auto")
        .map(str::to_string);
    let service = match form.field("aiService") {
        Some(value) => AiService::parse(value)?,
        None => state.context.backends.default_service(),
    };
    let name = form
        .field("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Batch {}", chrono::Utc::now().format("%Y-%m-%d %H:%M")));

    let files = form
        .files
        .into_iter()
        .map(|(file_name, data)| BatchFile::new(file_name, data))
        .collect();

    let (job_id, _handle) = state
        .batches
        .submit(BatchRequest {
            user_id,
            name,
            files,
            source_language,
            target_language,
            service,
        })
        .await?;

    tracing::info!(job_id = %job_id, "Batch job enqueued");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status: BatchStatus::Pending,
        }),
    )
        .into_response())
}

/// One job when `jobId` is given, otherwise the user's job list
#[tracing::instrument(skip(state))]
pub async fn get_batch_handler(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> ApiResult<Response> {
    let user_id = require_user(query.user_id.as_deref())?;
    match query.job_id {
        Some(job_id) => Ok(Json(state.batches.status(job_id, &user_id).await?).into_response()),
        None => Ok(Json(state.batches.list(&user_id).await?).into_response()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn cancel_batch_handler(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> ApiResult<Response> {
    let user_id = require_user(query.user_id.as_deref())?;
    let job_id = query
        .job_id
        .ok_or_else(|| ApiError::bad_request("jobId is required"))?;
    let job = state.batches.cancel(job_id, &user_id).await?;
    Ok(Json(job).into_response())
}
