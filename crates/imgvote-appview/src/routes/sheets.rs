use axum::extract::State;
use axum::Json;
use imgvote_cache::{ProfileTable, TeamTable};
use serde::{Deserialize, Serialize};

use crate::auth::{self, STUDENT_ACCOUNT};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /api/verify_password
pub async fn verify_password(
    State(state): State<AppState>,
    Json(body): Json<VerifyPasswordRequest>,
) -> Result<Json<VerifyPasswordResponse>, AppError> {
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password is required".into()))?;

    auth::verify(state.docs.as_ref(), STUDENT_ACCOUNT, Some(&password)).await?;

    Ok(Json(VerifyPasswordResponse {
        success: true,
        message: "Password verified",
    }))
}

/// GET /api/profiles (student password required)
pub async fn get_profiles(State(state): State<AppState>) -> Json<ProfileTable> {
    Json(state.gallery.profiles().await.as_ref().clone())
}

/// GET /api/teams (student password required)
pub async fn get_teams(State(state): State<AppState>) -> Json<TeamTable> {
    Json(state.gallery.teams().await.as_ref().clone())
}
