use std::sync::Arc;

use chrono::{DateTime, Utc};
use file_blob_cache::DiskCache;
use gcp_rest_client::{SheetsClient, StorageClient, TokenSource};
use imgvote_cache::memory::{MemoryBlobStore, MemoryDocumentStore, MemorySheetSource};
use imgvote_cache::{
    BlobStore, CacheSettings, DocumentStore, Gallery, ImageFetcher, SheetSource, TieredCache,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::adapters::{GcsBlobStore, GoogleSheetSource, PgDocumentStore};
use crate::auth::{ADMIN_ACCOUNT, STUDENT_ACCOUNT};
use crate::config::{Backend, Config, GcpConfig};
use crate::error::StartupError;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
    pub docs: Arc<dyn DocumentStore>,
    /// Root URL of the blob store, for upload messages
    pub storage_url: String,
    pub started_at: DateTime<Utc>,
}

/// Connected backend ports
pub struct Backends {
    pub blobs: Arc<dyn BlobStore>,
    pub docs: Arc<dyn DocumentStore>,
    pub sheets: Arc<dyn SheetSource>,
    /// `gs://{bucket}` or `memory://gallery`
    pub location: String,
}

impl AppState {
    pub fn new(backends: Backends, config: &Config) -> Self {
        Self::with_settings(backends, config, &CacheSettings::default())
    }

    pub fn with_settings(backends: Backends, config: &Config, settings: &CacheSettings) -> Self {
        let cache = TieredCache::new(
            backends.blobs.clone(),
            backends.docs.clone(),
            backends.sheets,
            config.layout.clone(),
            config.profile_sheet.clone(),
            config.team_sheet.clone(),
            settings,
        );
        let fetcher = ImageFetcher::new(
            backends.blobs.clone(),
            DiskCache::new(&config.cache_dir),
            config.layout.clone(),
        );
        let gallery = Gallery::new(cache, fetcher, backends.blobs, backends.docs.clone());

        Self {
            gallery: Arc::new(gallery),
            docs: backends.docs,
            storage_url: backends.location,
            started_at: Utc::now(),
        }
    }
}

/// Connect the backends selected by the configuration.
///
/// Passwords present in the configuration are written to the credential
/// store before any request is served.
pub async fn connect_backends(config: &Config) -> Result<Backends, StartupError> {
    match &config.backend {
        Backend::Gcp(gcp) => connect_gcp(gcp, config).await,
        Backend::Memory => Ok(memory_backends(config)),
    }
}

async fn connect_gcp(gcp: &GcpConfig, config: &Config) -> Result<Backends, StartupError> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&gcp.database_url)
        .await?;
    imgvote_db::migrate::migrate(&pool).await?;

    for (account, password) in seeded_credentials(config) {
        imgvote_db::credentials::set_password(&pool, account, password).await?;
        info!(account, "Seeded credential");
    }

    let tokens = Arc::new(match &gcp.access_token {
        Some(token) => TokenSource::fixed(token.clone()),
        None => TokenSource::metadata_server(),
    });

    info!(bucket = %gcp.bucket, "Using Cloud Storage backend");
    Ok(Backends {
        blobs: Arc::new(GcsBlobStore::new(StorageClient::new(&gcp.bucket, tokens.clone()))),
        docs: Arc::new(PgDocumentStore::new(pool)),
        sheets: Arc::new(GoogleSheetSource::new(SheetsClient::new(tokens))),
        location: format!("gs://{}", gcp.bucket),
    })
}

/// In-memory backends with the configured credentials
pub fn memory_backends(config: &Config) -> Backends {
    let docs = MemoryDocumentStore::new();
    for (account, password) in seeded_credentials(config) {
        docs.set_credential(account, password);
    }

    info!("Using in-memory backend");
    Backends {
        blobs: Arc::new(MemoryBlobStore::new()),
        docs: Arc::new(docs),
        sheets: Arc::new(MemorySheetSource::new()),
        location: "memory://gallery".to_string(),
    }
}

fn seeded_credentials(config: &Config) -> Vec<(&'static str, &str)> {
    [
        (STUDENT_ACCOUNT, config.student_password.as_deref()),
        (ADMIN_ACCOUNT, config.admin_password.as_deref()),
    ]
    .into_iter()
    .filter_map(|(account, password)| password.map(|p| (account, p)))
    .collect()
}
