//! Whole-value TTL cache with serialized refresh

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Stamped<T> {
    value: Arc<T>,
    refreshed_at: Instant,
}

/// One cached value guarded by one timestamp.
///
/// The lock is held across the refresh, so callers that race past expiry
/// wait for the first refresh and then see its result instead of issuing
/// their own.
pub struct TtlSlot<T> {
    name: &'static str,
    ttl: Duration,
    state: Mutex<Option<Stamped<T>>>,
    refreshes: AtomicU64,
}

impl<T> TtlSlot<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            state: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of successful refreshes since creation
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    fn fresh(&self, stamped: &Stamped<T>) -> bool {
        stamped.refreshed_at.elapsed() < self.ttl
    }

    /// Return the cached value if younger than the TTL, otherwise run
    /// `refresh`, replace the value wholesale and return it.
    ///
    /// A failed refresh leaves the slot untouched and returns the error.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut state = self.state.lock().await;
        if let Some(stamped) = state.as_ref() {
            if self.fresh(stamped) {
                debug!(cache = self.name, "Using cached value");
                return Ok(stamped.value.clone());
            }
        }

        debug!(cache = self.name, "Cache expired or not set, refreshing");
        let value = Arc::new(refresh().await?);
        *state = Some(Stamped {
            value: value.clone(),
            refreshed_at: Instant::now(),
        });
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        debug!(cache = self.name, "Cache refreshed");
        Ok(value)
    }

    /// Like [`get_or_refresh`](Self::get_or_refresh), but a failed refresh
    /// falls back to the previous value, however old.
    ///
    /// The error is returned only when there has never been a value. The
    /// stale value keeps its old timestamp, so the next call retries.
    /// A refresh that yields `None` has nothing worth keeping: the slot is
    /// left as it was and `None` is returned, so the next call reads again.
    pub async fn get_or_refresh_stale<F, Fut, E>(&self, refresh: F) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let mut state = self.state.lock().await;
        if let Some(stamped) = state.as_ref() {
            if self.fresh(stamped) {
                debug!(cache = self.name, "Using cached value");
                return Ok(Some(stamped.value.clone()));
            }
        }

        debug!(cache = self.name, "Cache expired or not set, refreshing");
        match refresh().await {
            Ok(Some(value)) => {
                let value = Arc::new(value);
                *state = Some(Stamped {
                    value: value.clone(),
                    refreshed_at: Instant::now(),
                });
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                debug!(cache = self.name, "Cache refreshed");
                Ok(Some(value))
            }
            Ok(None) => {
                debug!(cache = self.name, "Source empty, not caching");
                Ok(None)
            }
            Err(e) => match state.as_ref() {
                Some(stale) => {
                    warn!(cache = self.name, error = %e, "Refresh failed, serving stale value");
                    Ok(Some(stale.value.clone()))
                }
                None => Err(e),
            },
        }
    }

    /// Drop the cached value; the next read refreshes
    pub async fn clear(&self) {
        *self.state.lock().await = None;
    }
}
