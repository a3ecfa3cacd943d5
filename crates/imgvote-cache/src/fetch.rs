//! Disk → blob cache → original fallback chain

use crate::layout::{content_type_for_extension, BlobLayout};
use crate::ports::BlobStore;
use file_blob_cache::DiskCache;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tier that served an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Disk,
    BlobCache,
    Original,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Disk => write!(f, "disk"),
            Tier::BlobCache => write!(f, "blob-cache"),
            Tier::Original => write!(f, "original"),
        }
    }
}

/// Raw image bytes as stored, before normalization
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub tier: Tier,
}

/// Resolves image bytes and descriptions through the three storage tiers.
///
/// Faster tiers are populated on the way back. Failing to populate a tier
/// is logged and does not fail the read; failing to read a remote tier
/// counts as a miss at that tier.
pub struct ImageFetcher {
    blobs: Arc<dyn BlobStore>,
    disk: DiskCache,
    layout: BlobLayout,
}

impl ImageFetcher {
    pub fn new(blobs: Arc<dyn BlobStore>, disk: DiskCache, layout: BlobLayout) -> Self {
        Self {
            blobs,
            disk,
            layout,
        }
    }

    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    /// First hit wins; `None` when no tier has the image
    pub async fn fetch_image(&self, id: &str, ext: &str) -> Option<FetchedImage> {
        let file_name = BlobLayout::file_name(id, ext);
        let content_type = content_type_for_extension(ext);

        if let Some(data) = self.disk.get(&file_name).await {
            debug!(id, tier = %Tier::Disk, "Image hit");
            return Some(FetchedImage {
                data,
                content_type,
                tier: Tier::Disk,
            });
        }

        let cached_object = self.layout.cached_object(id, ext);
        match self.blobs.download(&cached_object).await {
            Ok(Some(data)) => {
                debug!(id, tier = %Tier::BlobCache, "Image hit");
                self.persist_to_disk(&file_name, &data).await;
                return Some(FetchedImage {
                    data,
                    content_type,
                    tier: Tier::BlobCache,
                });
            }
            Ok(None) => debug!(id, object = %cached_object, "Blob cache miss"),
            Err(e) => warn!(id, object = %cached_object, error = %e, "Blob cache read failed"),
        }

        let original_object = self.layout.original_object(id, ext);
        let data = match self.blobs.download(&original_object).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(id, object = %original_object, "Original missing");
                return None;
            }
            Err(e) => {
                warn!(id, object = %original_object, error = %e, "Original read failed");
                return None;
            }
        };

        debug!(id, tier = %Tier::Original, "Image hit");
        match self
            .blobs
            .upload(&cached_object, data.clone(), content_type)
            .await
        {
            Ok(()) => info!(id, object = %cached_object, "Populated blob cache"),
            Err(e) => warn!(id, object = %cached_object, error = %e, "Failed to populate blob cache"),
        }
        self.persist_to_disk(&file_name, &data).await;

        Some(FetchedImage {
            data,
            content_type,
            tier: Tier::Original,
        })
    }

    /// Description text: disk, then the original folder (persisted to
    /// disk); empty when missing
    pub async fn fetch_description(&self, id: &str, ext: &str) -> String {
        let file_name = BlobLayout::description_file_name(id, ext);

        if let Some(text) = self.disk.get_text(&file_name).await {
            return text;
        }

        let object = self.layout.description_object(id, ext);
        match self.blobs.download(&object).await {
            Ok(Some(data)) => {
                self.persist_to_disk(&file_name, &data).await;
                String::from_utf8_lossy(&data).into_owned()
            }
            Ok(None) => String::new(),
            Err(e) => {
                warn!(id, object = %object, error = %e, "Description read failed");
                String::new()
            }
        }
    }

    async fn persist_to_disk(&self, file_name: &str, data: &[u8]) {
        if let Err(e) = self.disk.put(file_name, data).await {
            warn!(file = file_name, error = %e, "Failed to write disk cache");
        }
    }
}
