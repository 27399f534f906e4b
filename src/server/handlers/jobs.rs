use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::error::SubfluxError;
use crate::model::TranslationJob;
use crate::server::error::{require_user, ApiResult};
use crate::server::handlers::UserQuery;
use crate::server::state::AppState;

#[tracing::instrument(skip(state))]
pub async fn jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<TranslationJob>>> {
    let user_id = require_user(query.user_id.as_deref())?;
    Ok(Json(state.context.jobs.list_translations(&user_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<TranslationJob>> {
    let user_id = require_user(query.user_id.as_deref())?;
    match state.context.jobs.get_translation(job_id).await? {
        Some(job) if job.user_id == user_id => Ok(Json(job)),
        _ => Err(SubfluxError::NotFound(format!("Translation job {}", job_id)).into()),
    }
}
