use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::auth::{self, ADMIN_ACCOUNT};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitQuery {
    pub confirm: Option<String>,
    pub password: Option<String>,
}

/// GET /init?confirm=&password=
///
/// Admin-only reset. Without `confirm` it reports what a reset would delete;
/// `confirm=no` cancels; `confirm=yes` wipes every image, like record and
/// cache tier.
pub async fn init(
    State(state): State<AppState>,
    Query(query): Query<InitQuery>,
) -> Result<Response, AppError> {
    auth::verify(state.docs.as_ref(), ADMIN_ACCOUNT, query.password.as_deref()).await?;

    match query.confirm.as_deref() {
        None => {
            let summary = state.gallery.reset_summary().await?;
            Ok(Json(json!({
                "message": "Add '?confirm=yes' to delete everything listed here.",
                "original_objects": summary.original_objects,
                "cached_objects": summary.cached_objects,
                "image_records": summary.image_records,
            }))
            .into_response())
        }
        Some("no") => Ok(Json(json!({ "message": "Initialization cancelled." })).into_response()),
        Some("yes") => {
            warn!("Reset confirmed by admin");
            let deleted = state.gallery.reset().await?;
            Ok(Json(json!({
                "message": "All data (storage, database, caches) initialized successfully",
                "deleted": deleted,
            }))
            .into_response())
        }
        Some(_) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Initialization not confirmed. Please add '?confirm=yes' to the URL to proceed."
            })),
        )
            .into_response()),
    }
}
