//! Local disk cache for blob-store objects
//!
//! Mirrors remote objects into a single flat directory, one file per object,
//! named exactly like the object's file name (`{id}{ext}`, `{id}{ext}.txt`).
//! The directory is a pure cache: any file may disappear at any time and will
//! be repopulated from the remote tiers on the next read.

mod cache;
mod types;

pub use cache::DiskCache;
pub use types::CacheStats;
