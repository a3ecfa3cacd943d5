use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imgvote_cache::StoreError;
use serde_json::json;

/// Application error type that converts to HTTP responses
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    /// The credential store could not be read
    AuthUnavailable(StoreError),
    Store(StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthUnavailable(e) => {
                tracing::error!(error = %e, "Credential lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication service unavailable".into(),
                )
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

/// Failures while starting the server
#[derive(Debug)]
pub enum StartupError {
    Config(String),
    Database(sqlx::Error),
    Io(Box<std::io::Error>),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(msg) => write!(f, "Configuration error: {}", msg),
            StartupError::Database(err) => write!(f, "Database error: {}", err),
            StartupError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::Database(err) => Some(err),
            StartupError::Io(err) => Some(err.as_ref()),
            StartupError::Config(_) => None,
        }
    }
}

impl From<sqlx::Error> for StartupError {
    fn from(err: sqlx::Error) -> Self {
        StartupError::Database(err)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(err: std::io::Error) -> Self {
        StartupError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for StartupError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        StartupError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let response = AppError::Unauthorized("Invalid password".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Invalid password");
    }

    #[tokio::test]
    async fn test_store_errors_are_generic() {
        let err = StoreError::backend(std::io::Error::other("bucket exploded"));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_auth_unavailable() {
        let response =
            AppError::AuthUnavailable(StoreError::backend(std::io::Error::other("down")))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Authentication service unavailable"
        );
    }

    #[test]
    fn test_startup_error_display() {
        let err = StartupError::Config("GCS_BUCKET_NAME environment variable is required".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: GCS_BUCKET_NAME environment variable is required"
        );
    }
}
