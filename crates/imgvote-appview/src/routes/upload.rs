use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::Json;
use imgvote_cache::NewUpload;
use serde::Serialize;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub description: String,
    pub uuid: String,
}

struct ImagePart {
    file_name: String,
    mime: Option<String>,
    data: Vec<u8>,
}

fn malformed(e: MultipartError) -> AppError {
    warn!(error = %e, "Malformed multipart body");
    AppError::BadRequest(format!("Malformed multipart body: {e}"))
}

/// POST /upload
///
/// Multipart form with an `image` file part and a `description` text part.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut image = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        match field.name() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(malformed)?.to_vec();
                image = Some(ImagePart {
                    file_name,
                    mime,
                    data,
                });
            }
            Some("description") => {
                description = Some(field.text().await.map_err(malformed)?);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::BadRequest("No image file provided".into()))?;
    let description =
        description.ok_or_else(|| AppError::BadRequest("No description provided".into()))?;
    if image.file_name.is_empty() {
        return Err(AppError::BadRequest("No selected file".into()));
    }

    let receipt = state
        .gallery
        .upload(NewUpload {
            file_name: image.file_name,
            mime: image.mime,
            data: image.data,
            description: description.clone(),
        })
        .await?;

    Ok(Json(UploadResponse {
        message: format!(
            "Image and description uploaded successfully to {}/{}",
            state.storage_url, receipt.object
        ),
        description,
        uuid: receipt.id,
    }))
}
