//! In-process backends
//!
//! Used by the `memory` backend of the server for local runs and by tests.
//! Each store counts its reads and can be switched into a failing mode.

use crate::error::{Result, StoreError};
use crate::ports::{BlobStore, DocumentStore, LikeRecord, SheetSource};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn unavailable(what: &str) -> StoreError {
    StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        format!("{what} unavailable"),
    ))
}

/// Latency and failure switches shared by the in-memory stores
#[derive(Default)]
struct Faults {
    failing: AtomicBool,
    latency_ms: AtomicU64,
}

impl Faults {
    async fn check(&self, what: &str) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.failing.load(Ordering::Relaxed) {
            return Err(unavailable(what));
        }
        Ok(())
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }
}

/// Object store kept in a sorted map
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    faults: Faults,
    list_calls: AtomicU64,
    download_calls: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, data: Vec<u8>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(name.to_string(), data);
        }
    }

    pub fn remove(&self, name: &str) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.remove(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::Relaxed)
    }

    pub fn download_calls(&self) -> u64 {
        self.download_calls.load(Ordering::Relaxed)
    }

    pub fn set_failing(&self, failing: bool) {
        self.faults.set_failing(failing);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults.set_latency(latency);
    }

    fn objects(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.objects.lock().map_err(|_| unavailable("blob store"))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        self.faults.check("blob store").await?;
        Ok(self
            .objects()?
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn download(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.download_calls.fetch_add(1, Ordering::Relaxed);
        self.faults.check("blob store").await?;
        Ok(self.objects()?.get(name).cloned())
    }

    async fn upload(&self, name: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        self.faults.check("blob store").await?;
        self.objects()?.insert(name.to_string(), data);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.faults.check("blob store").await?;
        self.objects()?.remove(name);
        Ok(())
    }
}

/// Like counters and credentials kept in hash maps
#[derive(Default)]
pub struct MemoryDocumentStore {
    likes: Mutex<HashMap<String, i64>>,
    credentials: Mutex<HashMap<String, String>>,
    faults: Faults,
    get_calls: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one account's password already set
    pub fn with_credential(account: &str, password: &str) -> Self {
        let store = Self::new();
        store.set_credential(account, password);
        store
    }

    pub fn set_credential(&self, account: &str, password: &str) {
        if let Ok(mut credentials) = self.credentials.lock() {
            credentials.insert(account.to_string(), password.to_string());
        }
    }

    pub fn set_likes(&self, id: &str, likes: i64) {
        if let Ok(mut map) = self.likes.lock() {
            map.insert(id.to_string(), likes);
        }
    }

    pub fn likes_of(&self, id: &str) -> Option<i64> {
        self.likes.lock().ok()?.get(id).copied()
    }

    /// Number of `get_likes` calls served
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::Relaxed)
    }

    pub fn set_failing(&self, failing: bool) {
        self.faults.set_failing(failing);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults.set_latency(latency);
    }

    fn likes(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, i64>>> {
        self.likes.lock().map_err(|_| unavailable("document store"))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_likes(&self, id: &str) -> Result<Option<i64>> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.faults.check("document store").await?;
        Ok(self.likes()?.get(id).copied())
    }

    async fn init_likes(&self, id: &str) -> Result<()> {
        self.faults.check("document store").await?;
        self.likes()?.entry(id.to_string()).or_insert(0);
        Ok(())
    }

    async fn increment_likes(&self, id: &str) -> Result<i64> {
        self.faults.check("document store").await?;
        let mut likes = self.likes()?;
        let count = likes.entry(id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn top_liked(&self, limit: usize) -> Result<Vec<LikeRecord>> {
        self.faults.check("document store").await?;
        let mut records: Vec<LikeRecord> = self
            .likes()?
            .iter()
            .map(|(id, likes)| LikeRecord {
                id: id.clone(),
                likes: *likes,
            })
            .collect();
        records.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.id.cmp(&b.id)));
        records.truncate(limit);
        Ok(records)
    }

    async fn count_images(&self) -> Result<u64> {
        self.faults.check("document store").await?;
        Ok(self.likes()?.len() as u64)
    }

    async fn delete_all_images(&self) -> Result<u64> {
        self.faults.check("document store").await?;
        let mut likes = self.likes()?;
        let removed = likes.len() as u64;
        likes.clear();
        Ok(removed)
    }

    async fn credential_password(&self, account: &str) -> Result<Option<String>> {
        self.faults.check("document store").await?;
        let credentials = self
            .credentials
            .lock()
            .map_err(|_| unavailable("document store"))?;
        Ok(credentials.get(account).cloned())
    }
}

/// Spreadsheet rows keyed by sheet id; unknown sheets read as empty
#[derive(Default)]
pub struct MemorySheetSource {
    sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    faults: Faults,
    read_calls: AtomicU64,
}

impl MemorySheetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rows(&self, sheet_id: &str, rows: Vec<Vec<String>>) {
        if let Ok(mut sheets) = self.sheets.lock() {
            sheets.insert(sheet_id.to_string(), rows);
        }
    }

    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::Relaxed)
    }

    pub fn set_failing(&self, failing: bool) {
        self.faults.set_failing(failing);
    }
}

#[async_trait]
impl SheetSource for MemorySheetSource {
    async fn read_range(&self, sheet_id: &str, _range: &str) -> Result<Vec<Vec<String>>> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.faults.check("sheet source").await?;
        let sheets = self
            .sheets
            .lock()
            .map_err(|_| unavailable("sheet source"))?;
        Ok(sheets.get(sheet_id).cloned().unwrap_or_default())
    }
}
