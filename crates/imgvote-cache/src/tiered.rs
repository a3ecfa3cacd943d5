//! In-process caches in front of the blob store, database and spreadsheet

use crate::error::{Result, StoreError};
use crate::layout::BlobLayout;
use crate::ports::{BlobStore, DocumentStore, SheetSource};
use crate::settings::{CacheSettings, SheetConfig};
use crate::sheets::{ProfileTable, TeamTable};
use crate::ttl::TtlSlot;
use moka::future::Cache;
use moka::ops::compute::Op;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Image id → original file extension (with leading dot)
pub type Listing = HashMap<String, String>;

/// Counters exposed on the health endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub listing_refreshes: u64,
    pub profile_refreshes: u64,
    pub team_refreshes: u64,
    pub like_entries: u64,
}

/// The four TTL caches of the gallery.
///
/// Each whole-value cache has its own lock held across its refresh, so a
/// slow spreadsheet read never blocks listing reads. Like counts are cached
/// per image id with independent expiry; concurrent misses on the same id
/// share one database read.
pub struct TieredCache {
    blobs: Arc<dyn BlobStore>,
    docs: Arc<dyn DocumentStore>,
    sheets: Arc<dyn SheetSource>,
    layout: BlobLayout,
    profile_sheet: SheetConfig,
    team_sheet: SheetConfig,
    listing: TtlSlot<Listing>,
    likes: Cache<String, i64>,
    profiles: TtlSlot<ProfileTable>,
    teams: TtlSlot<TeamTable>,
}

impl TieredCache {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        docs: Arc<dyn DocumentStore>,
        sheets: Arc<dyn SheetSource>,
        layout: BlobLayout,
        profile_sheet: SheetConfig,
        team_sheet: SheetConfig,
        settings: &CacheSettings,
    ) -> Self {
        let likes = Cache::builder()
            .max_capacity(settings.likes_capacity)
            .time_to_live(settings.likes_ttl)
            .build();

        Self {
            blobs,
            docs,
            sheets,
            layout,
            profile_sheet,
            team_sheet,
            listing: TtlSlot::new("listing", settings.listing_ttl),
            likes,
            profiles: TtlSlot::new("profiles", settings.sheet_ttl),
            teams: TtlSlot::new("teams", settings.sheet_ttl),
        }
    }

    pub fn layout(&self) -> &BlobLayout {
        &self.layout
    }

    /// Image id → extension map, rebuilt from the original folder when stale.
    ///
    /// Enumeration failures propagate; there is no stale fallback.
    pub async fn get_listing(&self) -> Result<Arc<Listing>> {
        self.listing
            .get_or_refresh(|| async {
                let prefix = self.layout.original_prefix();
                let names = self.blobs.list(&prefix).await?;
                let listing = self.layout.parse_listing(&names);
                info!(images = listing.len(), "Image listing refreshed");
                Ok::<_, StoreError>(listing)
            })
            .await
    }

    /// Like count of one image.
    ///
    /// Never fails: a database error is logged and reported as 0 likes and
    /// nothing is cached, so the next call asks the database again.
    ///
    /// The load runs inside the entry's compute, which moka serializes per
    /// key, so concurrent misses share one database read and a like recorded
    /// meanwhile waits for the load instead of being overwritten by it.
    pub async fn get_likes(&self, id: &str) -> i64 {
        let docs = self.docs.clone();
        let key = id.to_string();
        let result = self
            .likes
            .entry(id.to_string())
            .and_try_compute_with(|current| async move {
                if current.is_some() {
                    return Ok::<_, StoreError>(Op::Nop);
                }
                match docs.get_likes(&key).await? {
                    Some(likes) => Ok(Op::Put(likes)),
                    None => {
                        debug!(id = %key, "No like record, creating one");
                        docs.init_likes(&key).await?;
                        Ok(Op::Put(0))
                    }
                }
            })
            .await;

        match result {
            Ok(outcome) => outcome.into_entry().map_or(0, |entry| entry.into_value()),
            Err(e) => {
                error!(id, error = %e, "Failed to get likes");
                0
            }
        }
    }

    /// Write-through: record a like in the database and cache the new count
    /// immediately, bypassing the TTL.
    ///
    /// Counts only grow, so the cache keeps the larger of what it holds and
    /// what this like produced.
    pub async fn record_like(&self, id: &str) -> Result<i64> {
        let likes = self.docs.increment_likes(id).await?;
        self.likes
            .entry(id.to_string())
            .and_compute_with(|current| async move {
                let cached = current.map(|entry| entry.into_value()).unwrap_or(0);
                Op::Put(cached.max(likes))
            })
            .await;
        info!(id, likes, "Image liked");
        Ok(likes)
    }

    /// Profile table, stale-but-available on spreadsheet failure.
    ///
    /// A sheet without data rows is returned empty and not cached.
    pub async fn get_profile_rows(&self) -> Arc<ProfileTable> {
        let result = self
            .profiles
            .get_or_refresh_stale(|| async {
                let rows = self
                    .sheets
                    .read_range(&self.profile_sheet.sheet_id, &self.profile_sheet.range)
                    .await?;
                let table = ProfileTable::from_rows(rows);
                match &table {
                    Some(t) => info!(profiles = t.profiles.len(), "Profile rows refreshed"),
                    None => debug!("No data found in profile sheet"),
                }
                Ok::<_, StoreError>(table)
            })
            .await;

        match result {
            Ok(Some(table)) => table,
            Ok(None) => Arc::new(ProfileTable::default()),
            Err(e) => {
                error!(error = %e, "Failed to fetch profile rows");
                Arc::new(ProfileTable::default())
            }
        }
    }

    /// Team table (valid team numbers only), stale-but-available on failure
    pub async fn get_team_rows(&self) -> Arc<TeamTable> {
        let result = self
            .teams
            .get_or_refresh_stale(|| async {
                let rows = self
                    .sheets
                    .read_range(&self.team_sheet.sheet_id, &self.team_sheet.range)
                    .await?;
                let table = TeamTable::from_rows(rows);
                match &table {
                    Some(t) => info!(teams = t.teams.len(), "Team rows refreshed"),
                    None => debug!("No data found in team sheet"),
                }
                Ok::<_, StoreError>(table)
            })
            .await;

        match result {
            Ok(Some(table)) => table,
            Ok(None) => Arc::new(TeamTable::default()),
            Err(e) => {
                error!(error = %e, "Failed to fetch team rows");
                Arc::new(TeamTable::default())
            }
        }
    }

    /// Empty all four caches
    pub async fn clear(&self) {
        self.listing.clear().await;
        self.likes.invalidate_all();
        self.profiles.clear().await;
        self.teams.clear().await;
        warn!("In-memory caches cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            listing_refreshes: self.listing.refreshes(),
            profile_refreshes: self.profiles.refreshes(),
            team_refreshes: self.teams.refreshes(),
            like_entries: self.likes.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBlobStore, MemoryDocumentStore, MemorySheetSource};
    use std::time::Duration;

    const PROFILE_SHEET: &str = "profile-sheet";
    const TEAM_SHEET: &str = "team-sheet";

    struct Fixture {
        blobs: Arc<MemoryBlobStore>,
        docs: Arc<MemoryDocumentStore>,
        sheets: Arc<MemorySheetSource>,
        cache: Arc<TieredCache>,
    }

    fn fixture(settings: CacheSettings) -> Fixture {
        let blobs = Arc::new(MemoryBlobStore::new());
        let docs = Arc::new(MemoryDocumentStore::new());
        let sheets = Arc::new(MemorySheetSource::new());
        let cache = Arc::new(TieredCache::new(
            blobs.clone(),
            docs.clone(),
            sheets.clone(),
            BlobLayout::default(),
            SheetConfig::new(PROFILE_SHEET, "A1:I999"),
            SheetConfig::new(TEAM_SHEET, "A2:Z999"),
            &settings,
        ));
        Fixture {
            blobs,
            docs,
            sheets,
            cache,
        }
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_cached_within_ttl() {
        let f = fixture(CacheSettings::default());
        f.blobs.insert("20250901/aaa.jpg", b"a".to_vec());
        f.blobs.insert("20250901/aaa.jpg.txt", b"desc".to_vec());

        let first = f.cache.get_listing().await.unwrap();
        f.blobs.insert("20250901/bbb.png", b"b".to_vec());
        tokio::time::advance(Duration::from_millis(1900)).await;
        let second = f.cache.get_listing().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(f.blobs.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_rebuilt_after_ttl() {
        let f = fixture(CacheSettings::default());
        f.blobs.insert("20250901/aaa.jpg", b"a".to_vec());
        f.cache.get_listing().await.unwrap();

        f.blobs.remove("20250901/aaa.jpg");
        f.blobs.insert("20250901/bbb.png", b"b".to_vec());
        tokio::time::advance(Duration::from_secs(2)).await;

        let listing = f.cache.get_listing().await.unwrap();
        // Full replace, not merge
        assert_eq!(listing.len(), 1);
        assert_eq!(listing["bbb"], ".png");
        assert_eq!(f.blobs.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_single_refresh_under_concurrency() {
        let f = fixture(CacheSettings::default());
        f.blobs.insert("20250901/aaa.jpg", b"a".to_vec());
        f.blobs.set_latency(Duration::from_millis(100));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = f.cache.clone();
            handles.push(tokio::spawn(async move { cache.get_listing().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }
        assert_eq!(f.blobs.list_calls(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = f.cache.clone();
            handles.push(tokio::spawn(async move { cache.get_listing().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(f.blobs.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_failure_propagates() {
        let f = fixture(CacheSettings::default());
        f.blobs.set_failing(true);

        assert!(f.cache.get_listing().await.is_err());
    }

    #[tokio::test]
    async fn test_likes_first_touch_creates_record() {
        let f = fixture(CacheSettings::default());

        assert_eq!(f.cache.get_likes("aaa").await, 0);
        assert_eq!(f.docs.likes_of("aaa"), Some(0));
        assert_eq!(f.docs.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_likes_cached_within_ttl() {
        let f = fixture(CacheSettings::default());
        f.docs.set_likes("aaa", 5);

        assert_eq!(f.cache.get_likes("aaa").await, 5);
        f.docs.set_likes("aaa", 9);
        assert_eq!(f.cache.get_likes("aaa").await, 5);
        assert_eq!(f.docs.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_likes_refetched_after_ttl() {
        let f = fixture(CacheSettings {
            likes_ttl: Duration::from_millis(50),
            ..CacheSettings::default()
        });
        f.docs.set_likes("aaa", 5);

        assert_eq!(f.cache.get_likes("aaa").await, 5);
        f.docs.set_likes("aaa", 9);
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(f.cache.get_likes("aaa").await, 9);
        assert_eq!(f.docs.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_likes_failure_returns_zero() {
        let f = fixture(CacheSettings::default());
        f.docs.set_likes("aaa", 5);
        f.docs.set_failing(true);

        assert_eq!(f.cache.get_likes("aaa").await, 0);

        // Failure was not cached
        f.docs.set_failing(false);
        assert_eq!(f.cache.get_likes("aaa").await, 5);
    }

    #[tokio::test]
    async fn test_like_write_through_is_immediately_visible() {
        let f = fixture(CacheSettings::default());

        assert_eq!(f.cache.get_likes("aaa").await, 0);
        assert_eq!(f.cache.record_like("aaa").await.unwrap(), 1);
        assert_eq!(f.cache.get_likes("aaa").await, 1);
        assert_eq!(f.cache.record_like("aaa").await.unwrap(), 2);
        assert_eq!(f.cache.get_likes("aaa").await, 2);

        // Reads after the first were served from the cache
        assert_eq!(f.docs.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_like_failure_propagates() {
        let f = fixture(CacheSettings::default());
        f.docs.set_failing(true);

        assert!(f.cache.record_like("aaa").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_likes_reads_share_one_load() {
        let f = fixture(CacheSettings::default());
        f.docs.set_likes("aaa", 3);
        f.docs.set_latency(Duration::from_millis(50));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = f.cache.clone();
            handles.push(tokio::spawn(async move { cache.get_likes("aaa").await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 3);
        }
        assert_eq!(f.docs.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_like_during_slow_load_is_not_overwritten() {
        let f = fixture(CacheSettings::default());
        f.docs.set_latency(Duration::from_millis(100));

        let reader = {
            let cache = f.cache.clone();
            tokio::spawn(async move { cache.get_likes("aaa").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let written = f.cache.record_like("aaa").await.unwrap();
        reader.await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(f.docs.likes_of("aaa"), Some(1));
        assert_eq!(f.cache.get_likes("aaa").await, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_likes_keep_highest_count() {
        let f = fixture(CacheSettings::default());
        f.docs.set_likes("aaa", 4);
        let cache = f.cache.clone();

        cache.record_like("aaa").await.unwrap();
        // A slower writer landing afterwards with an older count
        cache
            .likes
            .entry("aaa".to_string())
            .and_compute_with(|current| async move {
                let cached = current.map(|e| e.into_value()).unwrap_or(0);
                Op::Put(cached.max(3))
            })
            .await;

        assert_eq!(cache.get_likes("aaa").await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_team_rows_filtered_and_cached() {
        let f = fixture(CacheSettings::default());
        f.sheets.set_rows(
            TEAM_SHEET,
            rows(&[&["번호", "팀장"], &["0", "a"], &["", "b"], &["abc", "c"], &["3", "d"]]),
        );

        let first = f.cache.get_team_rows().await;
        assert_eq!(first.teams.len(), 1);
        assert_eq!(first.teams[0][1], "d");

        tokio::time::advance(Duration::from_secs(299)).await;
        let second = f.cache.get_team_rows().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(f.sheets.read_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_rows_stale_on_failure() {
        let f = fixture(CacheSettings::default());
        f.sheets.set_rows(PROFILE_SHEET, rows(&[&["Name"], &["Kim"]]));

        let first = f.cache.get_profile_rows().await;
        assert_eq!(first.profiles.len(), 1);

        f.sheets.set_failing(true);
        tokio::time::advance(Duration::from_secs(301)).await;

        let stale = f.cache.get_profile_rows().await;
        assert!(Arc::ptr_eq(&first, &stale));
        assert_eq!(f.sheets.read_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sheet_is_read_again() {
        let f = fixture(CacheSettings::default());
        f.sheets.set_rows(PROFILE_SHEET, rows(&[&["Name", "Bio"]]));

        assert!(f.cache.get_profile_rows().await.profiles.is_empty());

        f.sheets
            .set_rows(PROFILE_SHEET, rows(&[&["Name", "Bio"], &["Kim", "hello"]]));
        let table = f.cache.get_profile_rows().await;

        assert_eq!(table.profiles.len(), 1);
        assert_eq!(f.sheets.read_calls(), 2);
        assert_eq!(f.cache.stats().profile_refreshes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sheet_failure_without_cache_is_empty() {
        let f = fixture(CacheSettings::default());
        f.sheets.set_failing(true);

        assert_eq!(*f.cache.get_profile_rows().await, ProfileTable::default());
        assert_eq!(*f.cache.get_team_rows().await, TeamTable::default());
    }

    #[tokio::test]
    async fn test_clear_empties_all_caches() {
        let f = fixture(CacheSettings::default());
        f.blobs.insert("20250901/aaa.jpg", b"a".to_vec());
        f.sheets.set_rows(PROFILE_SHEET, rows(&[&["Name"], &["Kim"]]));
        f.docs.set_likes("aaa", 4);

        f.cache.get_listing().await.unwrap();
        f.cache.get_likes("aaa").await;
        f.cache.get_profile_rows().await;

        f.cache.clear().await;
        f.docs.set_likes("aaa", 6);

        f.cache.get_listing().await.unwrap();
        assert_eq!(f.cache.get_likes("aaa").await, 6);
        f.cache.get_profile_rows().await;

        assert_eq!(f.blobs.list_calls(), 2);
        assert_eq!(f.sheets.read_calls(), 2);
        let stats = f.cache.stats();
        assert_eq!(stats.listing_refreshes, 2);
        assert_eq!(stats.profile_refreshes, 2);
    }
}
