//! Port implementations over Cloud Storage, PostgreSQL and Google Sheets

use async_trait::async_trait;
use gcp_rest_client::{SheetsClient, StorageClient};
use imgvote_cache::{BlobStore, DocumentStore, LikeRecord, SheetSource, StoreError};
use sqlx::postgres::PgPool;

type Result<T> = std::result::Result<T, StoreError>;

/// Cloud Storage bucket as a [`BlobStore`]
pub struct GcsBlobStore {
    client: StorageClient,
}

impl GcsBlobStore {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.client.list(prefix).await.map_err(StoreError::backend)?;
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    async fn download(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.client.download(name).await.map_err(StoreError::backend)
    }

    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .upload(name, data, content_type)
            .await
            .map_err(StoreError::backend)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.client.delete(name).await.map_err(StoreError::backend)
    }
}

/// PostgreSQL `images` and `credentials` tables as a [`DocumentStore`]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_likes(&self, id: &str) -> Result<Option<i64>> {
        let row = imgvote_db::images::get(&self.pool, id)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(|r| r.likes))
    }

    async fn init_likes(&self, id: &str) -> Result<()> {
        imgvote_db::images::init(&self.pool, id)
            .await
            .map_err(StoreError::backend)
    }

    async fn increment_likes(&self, id: &str) -> Result<i64> {
        imgvote_db::images::increment_likes(&self.pool, id)
            .await
            .map_err(StoreError::backend)
    }

    async fn top_liked(&self, limit: usize) -> Result<Vec<LikeRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = imgvote_db::images::top_liked(&self.pool, limit)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows
            .into_iter()
            .map(|r| LikeRecord {
                id: r.id,
                likes: r.likes,
            })
            .collect())
    }

    async fn count_images(&self) -> Result<u64> {
        let count = imgvote_db::images::count(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(count.max(0) as u64)
    }

    async fn delete_all_images(&self) -> Result<u64> {
        imgvote_db::images::delete_all(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    async fn credential_password(&self, account: &str) -> Result<Option<String>> {
        imgvote_db::credentials::get_password(&self.pool, account)
            .await
            .map_err(StoreError::backend)
    }
}

/// Sheets API v4 as a [`SheetSource`]
pub struct GoogleSheetSource {
    client: SheetsClient,
}

impl GoogleSheetSource {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn read_range(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        self.client
            .read_range(sheet_id, range)
            .await
            .map_err(StoreError::backend)
    }
}
