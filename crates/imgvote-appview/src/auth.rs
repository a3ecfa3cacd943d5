use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use imgvote_cache::DocumentStore;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Account whose password guards the profile and team endpoints
pub const STUDENT_ACCOUNT: &str = "student";

/// Account whose password guards the reset endpoint
pub const ADMIN_ACCOUNT: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct PasswordQuery {
    pub password: Option<String>,
}

/// Check a supplied password against the stored credential of `account`.
///
/// Missing password and mismatch are 401; an account without a credential
/// record is 404; a failing credential store is 500.
pub async fn verify(
    docs: &dyn DocumentStore,
    account: &str,
    password: Option<&str>,
) -> Result<(), AppError> {
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Password required".into()))?;

    let stored = docs
        .credential_password(account)
        .await
        .map_err(AppError::AuthUnavailable)?
        .ok_or_else(|| AppError::NotFound(format!("Credentials for {account} not found")))?;

    if stored != password {
        warn!(account, "Rejected password");
        return Err(AppError::Unauthorized("Invalid password".into()));
    }
    Ok(())
}

/// Middleware for routes readable with the student password
/// (`?password=` query parameter)
pub async fn require_student_password(
    State(state): State<AppState>,
    Query(query): Query<PasswordQuery>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    verify(state.docs.as_ref(), STUDENT_ACCOUNT, query.password.as_deref()).await?;
    Ok(next.run(request).await)
}
