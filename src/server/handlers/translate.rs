use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};

use crate::config::AiService;
use crate::server::error::{require_user, ApiError, ApiResult};
use crate::server::handlers::UploadForm;
use crate::server::state::AppState;
use crate::stream::{EventSink, StreamRequest};
use crate::translate::QualityTier;

const STREAM_CAPACITY: usize = 64;

fn build_request(state: &AppState, form: UploadForm) -> ApiResult<StreamRequest> {
    let user_id = require_user(form.field("userId"))?;
    let target_language = form
        .field("targetLanguage")
        .ok_or_else(|| ApiError::bad_request("targetLanguage is required"))?
        .to_string();
    let source_language = form
        .field("sourceLanguage")
        .filter(|lang| *lang != "auto")
        .map(str::to_string);
    let tier = QualityTier::parse(form.field("translationModel").unwrap_or_default())?;
    let service = match form.field("aiService") {
        Some(value) => AiService::parse(value)?,
        None => state.context.backends.default_service(),
    };

    let (file_name, data) = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let content = String::from_utf8(data)
        .map_err(|_| ApiError::bad_request(format!("{} is not valid UTF-8", file_name)))?;

    Ok(StreamRequest {
        user_id,
        file_name,
        content,
        source_language,
        target_language,
        tier,
        service,
    })
}

/// Translate one uploaded file, answering with a server-sent event stream
#[tracing::instrument(skip(state, multipart))]
pub async fn translate_stream_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match UploadForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => return e.into_response(),
    };
    let request = match build_request(&state, form) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    tracing::info!(
        user_id = %request.user_id,
        file_name = %request.file_name,
        target = %request.target_language,
        tier = request.tier.as_str(),
        "Streaming translation requested"
    );

    let (sink, mut rx) = EventSink::channel(STREAM_CAPACITY);
    let translator = state.translator.clone();
    tokio::spawn(async move {
        translator.run(request, sink).await;
    });

    let sse_stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok::<_, Infallible>(Event::default().data(json)),
                Err(e) => tracing::error!(error = %e, "Failed to serialize stream event"),
            }
        }
    };

    let keep_alive_secs = state.context.config.stream.keep_alive_secs;
    Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(keep_alive_secs))
                .text("keep-alive"),
        )
        .into_response()
}
