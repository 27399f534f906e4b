use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::server::state::AppState;
use crate::translate::QualityTier;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub service: String,
    pub backend: String,
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.context.backends.default_service();
    let availability = match state.context.backends.backend(service, QualityTier::Standard) {
        Ok(backend) => backend.check_availability().await,
        Err(e) => Err(e),
    };

    let (status, backend) = match availability {
        Ok(()) => ("healthy", "available".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, service = service.as_str(), "Translation backend unavailable");
            ("degraded", format!("unavailable: {}", e))
        }
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            environment: state.context.config.environment.as_str().to_string(),
            service: service.as_str().to_string(),
            backend,
        }),
    )
}
