use std::time::Duration;

/// How long the image listing is served before re-enumerating the blob store.
pub const LISTING_TTL: Duration = Duration::from_secs(2);

/// How long a per-image like count is served before re-reading the database.
pub const LIKES_TTL: Duration = Duration::from_secs(2);

/// How long profile and team rows are served before re-reading the sheet.
pub const SHEET_TTL: Duration = Duration::from_secs(300);

/// Maximum number of per-image like entries kept in memory.
pub const LIKES_CAPACITY: u64 = 10_000;

/// Number of images resolved concurrently for gallery listings.
pub const GALLERY_CONCURRENCY: usize = 8;

/// Default size of the top-liked ranking.
pub const TOP_LIKED_LIMIT: usize = 10;

/// Default A1 range of the profile sheet (header in row 1).
pub const PROFILE_SHEET_RANGE: &str = "Form Responses 1!A1:I999";

/// Default A1 range of the team sheet; row 1 holds a comment and is skipped.
pub const TEAM_SHEET_RANGE: &str = "A2:Z999";

/// Spreadsheet id and A1 range of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub sheet_id: String,
    pub range: String,
}

impl SheetConfig {
    pub fn new(sheet_id: &str, range: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            range: range.to_string(),
        }
    }
}

/// Expiration and sizing of the in-process caches
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub listing_ttl: Duration,
    pub likes_ttl: Duration,
    pub sheet_ttl: Duration,
    pub likes_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            listing_ttl: LISTING_TTL,
            likes_ttl: LIKES_TTL,
            sheet_ttl: SHEET_TTL,
            likes_capacity: LIKES_CAPACITY,
        }
    }
}
