use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::SubfluxError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error rendered as `{"error": "..."}` with a mapped status
#[derive(Debug)]
pub struct ApiError(pub SubfluxError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SubfluxError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SubfluxError::Validation(_) | SubfluxError::Parse(_) | SubfluxError::Voucher(_) => {
                StatusCode::BAD_REQUEST
            }
            SubfluxError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            SubfluxError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(SubfluxError::Validation(message.into()))
    }

    pub fn unauthorized() -> Self {
        ApiError(SubfluxError::Unauthorized("user id is required".to_string()))
    }
}

impl From<SubfluxError> for ApiError {
    fn from(err: SubfluxError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = %status, "Request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Trimmed, non-empty user id or `401`
pub fn require_user(user_id: Option<&str>) -> ApiResult<String> {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ApiError::unauthorized()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let cases = [
            (SubfluxError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (SubfluxError::Parse("x".into()), StatusCode::BAD_REQUEST),
            (SubfluxError::Voucher("x".into()), StatusCode::BAD_REQUEST),
            (
                SubfluxError::InsufficientCredits {
                    required: 1.0,
                    available: 0.0,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (SubfluxError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SubfluxError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn requires_non_blank_user() {
        assert_eq!(require_user(Some(" u1 ")).unwrap(), "u1");
        assert!(require_user(Some("  ")).is_err());
        assert!(require_user(None).is_err());
    }
}
