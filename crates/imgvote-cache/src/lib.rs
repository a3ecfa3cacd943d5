//! Tiered caching core for the image-voting gallery
//!
//! Every read path of the gallery goes through this crate:
//!
//! - [`TieredCache`] keeps four independent TTL caches in process memory
//!   (image listing, per-image likes, profile rows, team rows).
//! - [`ImageFetcher`] resolves image bytes and descriptions through
//!   local disk, then the blob store's cache folder, then the original
//!   folder, populating the faster tiers on the way back.
//! - [`Gallery`] composes both into the operations the HTTP layer exposes.
//!
//! Backends are reached through the [`BlobStore`], [`DocumentStore`] and
//! [`SheetSource`] ports; [`memory`] has in-process implementations.

mod error;
mod fetch;
mod gallery;
mod layout;
pub mod memory;
mod normalize;
mod ports;
mod settings;
mod sheets;
mod tiered;
mod ttl;

pub use error::{Result, StoreError};
pub use fetch::{FetchedImage, ImageFetcher, Tier};
pub use gallery::{Gallery, GalleryImage, NewUpload, ResetSummary, UploadReceipt};
pub use layout::{content_type_for_extension, upload_extension, BlobLayout};
pub use normalize::normalize;
pub use ports::{BlobStore, DocumentStore, LikeRecord, SheetSource};
pub use settings::{
    CacheSettings, SheetConfig, GALLERY_CONCURRENCY, LIKES_CAPACITY, LIKES_TTL, LISTING_TTL,
    PROFILE_SHEET_RANGE, SHEET_TTL, TEAM_SHEET_RANGE, TOP_LIKED_LIMIT,
};
pub use sheets::{is_valid_team_number, ProfileTable, TeamTable};
pub use tiered::{CacheStats, Listing, TieredCache};
pub use ttl::TtlSlot;
