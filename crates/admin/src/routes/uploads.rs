//! Product image upload.

use axum::extract::{Multipart, State};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::services::storage::{Backend, ImageStore};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_url: String,
    pub message: &'static str,
}

/// POST /api/admin/upload/image
///
/// Multipart field `file`. Stored in S3 when configured, else on local disk.
#[instrument(skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let stored = ImageStore::new(state.s3(), &state.config().storage)
            .store(&file_name, &content_type, bytes.to_vec())
            .await?;

        let message = match stored.backend {
            Backend::S3 => "Image uploaded",
            Backend::Local => "Image saved locally",
        };
        return Ok(Json(UploadResponse {
            success: true,
            image_url: stored.url,
            message,
        }));
    }

    Err(AppError::BadRequest("File not found".to_string()))
}
