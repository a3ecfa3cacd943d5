//! Gallery operations exposed to the HTTP layer

use crate::error::Result;
use crate::fetch::{FetchedImage, ImageFetcher};
use crate::layout::{content_type_for_extension, upload_extension, BlobLayout};
use crate::normalize::normalize;
use crate::ports::{BlobStore, DocumentStore};
use crate::settings::GALLERY_CONCURRENCY;
use crate::sheets::{ProfileTable, TeamTable};
use crate::tiered::{CacheStats, TieredCache};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const DESCRIPTION_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// One image ready to be rendered
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub id: String,
    /// Normalized bytes, or the stored bytes if normalization failed
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub description: String,
    pub likes: i64,
}

/// A new image as received from a client
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub file_name: String,
    pub mime: Option<String>,
    pub data: Vec<u8>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub id: String,
    /// Blob-store name of the stored original
    pub object: String,
}

/// Object and record counts affected by a reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub original_objects: u64,
    pub cached_objects: u64,
    pub image_records: u64,
}

pub struct Gallery {
    cache: TieredCache,
    fetcher: ImageFetcher,
    blobs: Arc<dyn BlobStore>,
    docs: Arc<dyn DocumentStore>,
}

impl Gallery {
    pub fn new(
        cache: TieredCache,
        fetcher: ImageFetcher,
        blobs: Arc<dyn BlobStore>,
        docs: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            blobs,
            docs,
        }
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    fn layout(&self) -> &BlobLayout {
        self.cache.layout()
    }

    /// One image by id; `None` if the id is not in the listing or no tier
    /// holds its bytes
    pub async fn image(&self, id: &str) -> Result<Option<GalleryImage>> {
        let listing = self.cache.get_listing().await?;
        let Some(ext) = listing.get(id) else {
            return Ok(None);
        };
        Ok(self.resolve(id, ext, None).await)
    }

    /// Every listed image, sorted by id. Unresolvable entries are skipped.
    pub async fn all_images(&self) -> Result<Vec<GalleryImage>> {
        let listing = self.cache.get_listing().await?;
        let mut entries: Vec<(String, String)> = listing
            .iter()
            .map(|(id, ext)| (id.clone(), ext.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let images: Vec<GalleryImage> = stream::iter(entries)
            .map(|(id, ext)| async move { self.resolve(&id, &ext, None).await })
            .buffered(GALLERY_CONCURRENCY)
            .filter_map(|image| async move { image })
            .collect()
            .await;

        info!(listed = listing.len(), resolved = images.len(), "Resolved gallery");
        Ok(images)
    }

    /// Most-liked images with the counts reported by the ranking query.
    ///
    /// Ranked ids missing from the listing or from every tier are skipped.
    pub async fn top_liked(&self, limit: usize) -> Result<Vec<GalleryImage>> {
        let ranking = self.docs.top_liked(limit).await?;
        let listing = self.cache.get_listing().await?;

        let ranked: Vec<_> = ranking
            .into_iter()
            .filter_map(|record| match listing.get(&record.id) {
                Some(ext) => Some((record, ext.clone())),
                None => {
                    warn!(id = %record.id, "Ranked image not in listing, skipping");
                    None
                }
            })
            .collect();

        Ok(stream::iter(ranked)
            .map(|(record, ext)| async move {
                self.resolve(&record.id, &ext, Some(record.likes)).await
            })
            .buffered(GALLERY_CONCURRENCY)
            .filter_map(|image| async move { image })
            .collect()
            .await)
    }

    async fn resolve(&self, id: &str, ext: &str, likes: Option<i64>) -> Option<GalleryImage> {
        let Some(fetched) = self.fetcher.fetch_image(id, ext).await else {
            warn!(id, ext, "Listed image could not be fetched, skipping");
            return None;
        };

        let FetchedImage {
            data, content_type, ..
        } = fetched;
        let ext_owned = ext.to_string();
        let data = match tokio::task::spawn_blocking(move || normalize(&data, &ext_owned)).await {
            Ok(data) => data,
            Err(e) => {
                error!(id, error = %e, "Normalization task failed");
                return None;
            }
        };

        let description = self.fetcher.fetch_description(id, ext).await;
        let likes = match likes {
            Some(likes) => likes,
            None => self.cache.get_likes(id).await,
        };

        Some(GalleryImage {
            id: id.to_string(),
            data,
            content_type,
            description,
            likes,
        })
    }

    /// Store a new original and its description under a fresh id.
    ///
    /// The listing is not invalidated; the image appears once its TTL lapses.
    pub async fn upload(&self, upload: NewUpload) -> Result<UploadReceipt> {
        let ext = upload_extension(&upload.file_name, upload.mime.as_deref());
        let id = Uuid::new_v4().to_string();
        let layout = self.layout();

        let object = layout.original_object(&id, &ext);
        let content_type = upload
            .mime
            .as_deref()
            .unwrap_or_else(|| content_type_for_extension(&ext));
        let size = upload.data.len();
        self.blobs.upload(&object, upload.data, content_type).await?;

        let description_object = layout.description_object(&id, &ext);
        self.blobs
            .upload(
                &description_object,
                upload.description.into_bytes(),
                DESCRIPTION_CONTENT_TYPE,
            )
            .await?;

        info!(id = %id, object = %object, size, "Image uploaded");
        Ok(UploadReceipt { id, object })
    }

    /// Record one like; returns the new count
    pub async fn like(&self, id: &str) -> Result<i64> {
        self.cache.record_like(id).await
    }

    pub async fn reset_summary(&self) -> Result<ResetSummary> {
        let layout = self.layout();
        let original_objects = self.blobs.list(&layout.original_prefix()).await?.len() as u64;
        let cached_objects = self.blobs.list(&layout.cached_prefix()).await?.len() as u64;
        let image_records = self.docs.count_images().await?;

        Ok(ResetSummary {
            original_objects,
            cached_objects,
            image_records,
        })
    }

    /// Delete every stored image, description, cache copy and like record,
    /// then empty the in-process caches and the disk tier.
    pub async fn reset(&self) -> Result<ResetSummary> {
        let layout = self.layout();
        let original_objects = self.delete_prefix(&layout.original_prefix()).await?;
        let cached_objects = self.delete_prefix(&layout.cached_prefix()).await?;
        let image_records = self.docs.delete_all_images().await?;

        self.cache.clear().await;
        match self.fetcher.disk().clear().await {
            Ok(removed) => info!(removed, "Disk tier emptied"),
            Err(e) => warn!(error = %e, "Failed to empty disk tier"),
        }

        let summary = ResetSummary {
            original_objects,
            cached_objects,
            image_records,
        };
        warn!(?summary, "Gallery reset");
        Ok(summary)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let names = self.blobs.list(prefix).await?;
        for name in &names {
            self.blobs.delete(name).await?;
        }
        info!(prefix, deleted = names.len(), "Deleted objects");
        Ok(names.len() as u64)
    }

    pub async fn profiles(&self) -> Arc<ProfileTable> {
        self.cache.get_profile_rows().await
    }

    pub async fn teams(&self) -> Arc<TeamTable> {
        self.cache.get_team_rows().await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
