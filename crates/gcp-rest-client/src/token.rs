//! Access tokens for Google APIs

use crate::error::{GcpError, Result};
use crate::types::AccessTokenResponse;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Scopes requested from the metadata server
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/devstorage.read_write",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Where bearer tokens come from
pub struct TokenSource {
    inner: Inner,
}

enum Inner {
    /// A fixed token (local development, tests)
    Static(String),
    /// The instance metadata server of the runtime's service account
    Metadata {
        client: Client,
        url: String,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl TokenSource {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            inner: Inner::Static(token.into()),
        }
    }

    /// Token source backed by the default metadata server endpoint
    pub fn metadata_server() -> Self {
        Self::metadata_server_at(METADATA_TOKEN_URL)
    }

    pub fn metadata_server_at(url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            inner: Inner::Metadata {
                client,
                url: format!("{}?scopes={}", url, urlencoding::encode(&SCOPES.join(","))),
                cached: Mutex::new(None),
            },
        }
    }

    /// Current bearer token, refreshing from the metadata server when needed
    pub async fn token(&self) -> Result<String> {
        match &self.inner {
            Inner::Static(token) => Ok(token.clone()),
            Inner::Metadata {
                client,
                url,
                cached,
            } => {
                let mut cached = cached.lock().await;
                if let Some(token) = cached.as_ref() {
                    if Instant::now() < token.expires_at {
                        return Ok(token.value.clone());
                    }
                }

                debug!("Fetching access token from metadata server");
                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| GcpError::Token(format!("metadata server unreachable: {e}")))?;

                if !response.status().is_success() {
                    return Err(GcpError::Token(format!(
                        "metadata server returned status {}",
                        response.status()
                    )));
                }

                let body: AccessTokenResponse = response.json().await?;
                let lifetime = Duration::from_secs(body.expires_in);
                *cached = Some(CachedToken {
                    value: body.access_token.clone(),
                    expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
                });
                info!(expires_in = body.expires_in, "Refreshed access token");

                Ok(body.access_token)
            }
        }
    }
}
