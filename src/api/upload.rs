//! Upload API endpoints
//!
//! POST /api/v1/upload/image accepts multipart/form-data with a single
//! image field. Validation (content type, size) happens before any storage
//! call, local or remote.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::StoredImage;

/// POST /api/v1/upload/image - Upload a single image
///
/// Accepts a field named "file" or "image".
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StoredImage>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" && name != "image" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let stored = state
            .image_store
            .store(&filename, &content_type, &data)
            .await?;

        return Ok(Json(stored));
    }

    Err(ApiError::validation_error("No image file provided"))
}
