//! File-per-object disk cache with hit/miss accounting

use crate::types::CacheStats;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

/// A flat directory of cached objects, addressed by file name
pub struct DiskCache {
    /// Directory where cached files are stored
    cache_dir: PathBuf,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
    /// Successful writes
    writes: AtomicU64,
    /// Suffix counter for temp files, unique within the process
    temp_seq: AtomicU64,
}

impl DiskCache {
    /// Create a new disk cache rooted at `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            temp_seq: AtomicU64::new(0),
        }
    }

    /// Ensure the cache directory exists
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        info!(cache_dir = ?self.cache_dir, "Disk cache initialized");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Resolve a file name to its path inside the cache directory.
    ///
    /// Names must be a single path component: no separators, no `..`.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains('\0');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid cache file name: {name:?}"),
            ));
        }
        Ok(self.cache_dir.join(name))
    }

    /// Read a cached file, `None` on miss.
    ///
    /// Read errors other than "not found" are logged and reported as a miss.
    pub async fn get(&self, name: &str) -> Option<Vec<u8>> {
        let path = match self.path_for(name) {
            Ok(path) => path,
            Err(e) => {
                warn!(name, error = %e, "Rejected cache lookup");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match fs::read(&path).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(name, size = data.len(), "Disk cache hit");
                Some(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(name, "Disk cache miss");
                None
            }
            Err(e) => {
                warn!(name, error = %e, "Failed to read cached file");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Read a cached UTF-8 text file, `None` on miss or invalid UTF-8
    pub async fn get_text(&self, name: &str) -> Option<String> {
        let data = self.get(name).await?;
        match String::from_utf8(data) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(name, error = %e, "Cached text file is not valid UTF-8");
                None
            }
        }
    }

    /// Store a file in the cache.
    ///
    /// The data is written to a temp file first and renamed into place, so a
    /// concurrent reader never observes a partial file.
    pub async fn put(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path_for(name)?;
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .cache_dir
            .join(format!(".{name}.{}.{seq}.tmp", std::process::id()));

        fs::write(&temp, data).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(name, size = data.len(), "Cached file on disk");
        Ok(())
    }

    /// Remove every entry in the cache directory.
    ///
    /// Individual failures are logged and skipped. Returns the number of
    /// entries removed. A missing directory is not an error.
    pub async fn clear(&self) -> io::Result<usize> {
        let mut dir = match fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(cache_dir = ?self.cache_dir, "Cache directory missing, nothing to clear");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let result = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path).await,
                Ok(_) => fs::remove_file(&path).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    removed += 1;
                    debug!(path = ?path, "Deleted cached file");
                }
                Err(e) => warn!(path = ?path, error = %e, "Failed to delete cached file"),
            }
        }

        info!(removed, cache_dir = ?self.cache_dir, "Disk cache cleared");
        Ok(removed)
    }

    /// Current cache statistics (scans the directory)
    pub async fn stats(&self) -> CacheStats {
        let mut entries = 0;
        let mut total_size = 0;

        if let Ok(mut dir) = fs::read_dir(&self.cache_dir).await {
            while let Ok(Some(entry)) = dir.next_entry().await {
                if let Ok(meta) = entry.metadata().await {
                    if meta.is_file() && !entry.file_name().to_string_lossy().ends_with(".tmp") {
                        entries += 1;
                        total_size += meta.len();
                    }
                }
            }
        }

        CacheStats {
            entries,
            total_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
