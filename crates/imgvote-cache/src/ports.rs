//! Backend ports consumed by the caching core

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Object storage holding originals, descriptions and the derived cache folder
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Full names of all objects starting with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Object content, `None` if absent
    async fn download(&self, name: &str) -> Result<Option<Vec<u8>>>;

    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Delete one object; absent objects are not an error
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Like counter of one image, as returned by ranking queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub id: String,
    pub likes: i64,
}

/// Document database holding like counters and credentials
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current like count, `None` if the image has no record yet
    async fn get_likes(&self, id: &str) -> Result<Option<i64>>;

    /// Create the record with zero likes
    async fn init_likes(&self, id: &str) -> Result<()>;

    /// Add one like (creating the record at 1 if absent), returning the new count
    async fn increment_likes(&self, id: &str) -> Result<i64>;

    /// Records ordered by likes, highest first
    async fn top_liked(&self, limit: usize) -> Result<Vec<LikeRecord>>;

    async fn count_images(&self) -> Result<u64>;

    /// Delete every image record, returning how many were removed
    async fn delete_all_images(&self) -> Result<u64>;

    /// Stored password of an account, `None` if no such account
    async fn credential_password(&self, account: &str) -> Result<Option<String>>;
}

/// Read-only spreadsheet access
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Rows of string cells for an A1 range; trailing empty cells may be absent
    async fn read_range(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;
}
