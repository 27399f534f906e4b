use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::server::handlers::{
    cancel_batch_handler, credits_handler, file_handler, get_batch_handler, health_handler,
    job_handler, jobs_handler, redeem_handler, submit_batch_handler, translate_stream_handler,
};
use crate::server::state::AppState;

/// Room for multipart framing on top of the file payloads
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let limits = &state.context.config.batch;
    let body_limit = limits.max_files.saturating_mul(limits.max_file_bytes) + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/translate-stream", post(translate_stream_handler))
        .route(
            "/api/batch",
            post(submit_batch_handler)
                .get(get_batch_handler)
                .delete(cancel_batch_handler),
        )
        .route("/api/credits", get(credits_handler))
        .route("/api/credits/redeem", post(redeem_handler))
        .route("/api/jobs", get(jobs_handler))
        .route("/api/jobs/:job_id", get(job_handler))
        .route("/files/*key", get(file_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
