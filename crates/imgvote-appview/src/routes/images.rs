use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use imgvote_cache::{GalleryImage, TOP_LIKED_LIMIT};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Single image with its base64 payload
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_data: String,
    pub image_mimetype: &'static str,
    pub description: String,
    pub likes: i64,
}

/// Gallery entry: an image plus its id
#[derive(Debug, Serialize)]
pub struct GalleryEntry {
    pub uuid: String,
    #[serde(flatten)]
    pub image: ImageResponse,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub images: Vec<GalleryEntry>,
}

impl From<GalleryImage> for GalleryEntry {
    fn from(image: GalleryImage) -> Self {
        Self {
            uuid: image.id,
            image: ImageResponse {
                image_data: STANDARD.encode(&image.data),
                image_mimetype: image.content_type,
                description: image.description,
                likes: image.likes,
            },
        }
    }
}

/// GET /image/{id}
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let image = state
        .gallery
        .image(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found or could not be retrieved".into()))?;

    Ok(Json(GalleryEntry::from(image).image))
}

/// GET /images/all
pub async fn get_all(State(state): State<AppState>) -> Result<Json<GalleryResponse>, AppError> {
    let images = state.gallery.all_images().await?;
    Ok(Json(GalleryResponse {
        images: images.into_iter().map(GalleryEntry::from).collect(),
    }))
}

/// GET /images/top10_liked
pub async fn get_top_liked(
    State(state): State<AppState>,
) -> Result<Json<GalleryResponse>, AppError> {
    let images = state.gallery.top_liked(TOP_LIKED_LIMIT).await?;
    Ok(Json(GalleryResponse {
        images: images.into_iter().map(GalleryEntry::from).collect(),
    }))
}
