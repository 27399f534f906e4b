mod batch;
mod credits;
mod files;
mod health;
mod jobs;
mod translate;

pub use batch::{cancel_batch_handler, get_batch_handler, submit_batch_handler};
pub use credits::{credits_handler, redeem_handler};
pub use files::file_handler;
pub use health::health_handler;
pub use jobs::{job_handler, jobs_handler};
pub use translate::translate_stream_handler;

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::Deserialize;

use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// Multipart upload split into text fields and file parts
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<(String, Vec<u8>)>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(f)) => f,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read multipart");
                    return Err(ApiError::bad_request(format!("Failed to read multipart: {}", e)));
                }
            };
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                    tracing::debug!(file_name = %file_name, bytes = data.len(), "File part received");
                    form.files.push((file_name, data.to_vec()));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Failed to read field {}: {}", name, e)))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Non-blank text field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
