//! Error types for the Google REST clients

use std::fmt;

/// Errors that can occur when talking to Google APIs
#[derive(Debug)]
pub enum GcpError {
    /// HTTP request failed
    Http(Box<reqwest::Error>),
    /// Failed to parse a JSON response
    Json(serde_json::Error),
    /// The API answered with a non-success status
    Api { status: u16, message: String },
    /// No usable access token
    Token(String),
}

impl fmt::Display for GcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Json(e) => write!(f, "JSON parse error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Token(msg) => write!(f, "Token error: {}", msg),
        }
    }
}

impl std::error::Error for GcpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e.as_ref()),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GcpError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(Box::new(e))
    }
}

impl From<serde_json::Error> for GcpError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl GcpError {
    /// Build an `Api` error from a failed response, keeping the body as message
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Self::Api { status, message }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
