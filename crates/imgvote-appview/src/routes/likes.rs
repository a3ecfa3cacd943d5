use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub uuid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: &'static str,
    pub new_likes: i64,
}

/// POST /like_image
pub async fn like_image(
    State(state): State<AppState>,
    Json(body): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    let id = body
        .uuid
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Image UUID not provided".into()))?;

    let new_likes = state.gallery.like(&id).await?;

    Ok(Json(LikeResponse {
        message: "Image liked successfully",
        new_likes,
    }))
}
