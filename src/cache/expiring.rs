//! Time-expiring in-memory cache for raw API responses
//!
//! Provides an `ExpiringCache` that memoizes response bytes by request URL.
//! Entries are never checked for staleness on read; a background reaper task
//! sweeps the whole table once per interval and drops every entry older than
//! the interval. An entry therefore lives between one and two intervals
//! depending on where it lands relative to the sweep.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Errors that can occur when constructing a cache
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The interval would make the reaper spin
    #[error("Cache interval must be greater than zero")]
    ZeroInterval,

    /// The reaper needs a tokio runtime to run on
    #[error("Cache must be created inside a tokio runtime")]
    NoRuntime,
}

/// A single cached payload
///
/// Entries are immutable; a repeated `put` replaces the whole entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The raw response bytes
    value: Bytes,
    /// When the entry was inserted
    created_at: Instant,
}

/// State shared between every cache handle and the reaper
#[derive(Debug)]
struct Shared {
    entries: RwLock<HashMap<String, CacheEntry>>,
    interval: Duration,
    /// Never sent on; dropping it with the last handle stops the reaper
    _shutdown_tx: mpsc::Sender<()>,
}

impl Shared {
    /// Removes every entry whose age exceeds the interval
    ///
    /// Holds the write lock for the whole pass so readers never observe a
    /// partially applied sweep.
    fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= self.interval);
        before - entries.len()
    }
}

/// Concurrent key/value cache with interval-based expiry
///
/// Cloning is cheap and every clone refers to the same table. The reaper
/// runs until the last clone is dropped.
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    shared: Arc<Shared>,
}

impl ExpiringCache {
    /// Creates an empty cache and starts its reaper
    ///
    /// # Arguments
    /// * `interval` - Both the staleness threshold and the sweep period
    ///
    /// # Returns
    /// * `Ok(ExpiringCache)` with the reaper running
    /// * `Err(CacheError::ZeroInterval)` if `interval` is zero
    /// * `Err(CacheError::NoRuntime)` if called outside a tokio runtime
    pub fn new(interval: Duration) -> Result<Self, CacheError> {
        Self::with_reaper(interval).map(|(cache, _)| cache)
    }

    /// Creates the cache and hands back the reaper's join handle
    pub(crate) fn with_reaper(interval: Duration) -> Result<(Self, JoinHandle<()>), CacheError> {
        if interval.is_zero() {
            return Err(CacheError::ZeroInterval);
        }
        let handle = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::new()),
            interval,
            _shutdown_tx: shutdown_tx,
        });

        // Anchor the first tick one interval after construction
        let mut ticker = {
            let _guard = handle.enter();
            tokio::time::interval_at(Instant::now() + interval, interval)
        };
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reaper = handle.spawn(run_reaper(Arc::downgrade(&shared), ticker, shutdown_rx));

        Ok((Self { shared }, reaper))
    }

    /// Inserts or replaces the payload stored under `key`
    ///
    /// The entry is stamped with the current time and is visible to every
    /// other caller once this returns.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };
        self.shared.entries.write().insert(key.into(), entry);
    }

    /// Returns the payload stored under `key`, if any
    ///
    /// No staleness check happens here; an entry the reaper has not swept
    /// yet is still returned.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.shared
            .entries
            .read()
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// The configured expiry interval
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Number of entries currently held, stale or not
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    /// Whether the cache currently holds no entries
    pub fn is_empty(&self) -> bool {
        self.shared.entries.read().is_empty()
    }
}

/// Sweeps the table on every tick until the cache is dropped
async fn run_reaper(
    shared: Weak<Shared>,
    mut ticker: tokio::time::Interval,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        tokio::select! {
            now = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.sweep(now.max(Instant::now()));
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let cache = ExpiringCache::new(Duration::from_secs(5)).unwrap();
        assert!(cache.get("https://example.com/missing").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_put_then_get_returns_value() {
        let cache = ExpiringCache::new(Duration::from_secs(5)).unwrap();
        cache.put("u1", "test");

        assert_eq!(cache.get("u1").as_deref(), Some(&b"test"[..]));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_later_put_replaces_value() {
        let cache = ExpiringCache::new(Duration::from_secs(5)).unwrap();
        cache.put("u1", "a much longer first value");
        cache.put("u1", "short");

        assert_eq!(cache.get("u1").as_deref(), Some(&b"short"[..]));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_binary_payloads_roundtrip() {
        let cache = ExpiringCache::new(Duration::from_secs(5)).unwrap();
        let binary: Vec<u8> = (0..=255).collect();
        cache.put("empty", Vec::<u8>::new());
        cache.put("binary", binary.clone());

        assert_eq!(cache.get("empty").as_deref(), Some(&b""[..]));
        assert_eq!(cache.get("binary").as_deref(), Some(binary.as_slice()));
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let result = ExpiringCache::new(Duration::ZERO);
        assert_eq!(result.unwrap_err(), CacheError::ZeroInterval);
    }

    #[test]
    fn test_construction_outside_runtime_is_rejected() {
        let result = ExpiringCache::new(Duration::from_secs(1));
        assert_eq!(result.unwrap_err(), CacheError::NoRuntime);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_survives_until_interval() {
        let cache = ExpiringCache::new(Duration::from_secs(2)).unwrap();
        cache.put("u1", "test");

        sleep(Duration::from_secs(1)).await;

        assert_eq!(cache.get("u1").as_deref(), Some(&b"test"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_gone_after_two_intervals() {
        let cache = ExpiringCache::new(Duration::from_secs(1)).unwrap();
        cache.put("u1", "test");

        sleep(Duration::from_secs(2) + Duration::from_millis(100)).await;

        assert!(cache.get("u1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_aged_exactly_one_interval_survives_first_tick() {
        let cache = ExpiringCache::new(Duration::from_secs(1)).unwrap();
        cache.put("u1", "test");

        // The tick at t=1s sees an age of exactly 1s and keeps the entry
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(cache.get("u1").as_deref(), Some(&b"test"[..]));

        // The tick at t=2s sees 2s and removes it
        sleep(Duration::from_secs(1)).await;
        assert!(cache.get("u1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_inserted_after_tick_lives_past_one_interval() {
        let cache = ExpiringCache::new(Duration::from_secs(10)).unwrap();

        // Just after the first sweep at t=10s
        sleep(Duration::from_secs(11)).await;
        cache.put("late", "value");

        // The sweep at t=20s sees an age of 9s and keeps it
        sleep(Duration::from_secs(9) + Duration::from_millis(500)).await;
        assert!(cache.get("late").is_some());

        // The sweep at t=30s sees an age of 19s
        sleep(Duration::from_secs(10)).await;
        assert!(cache.get("late").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_only_removes_stale_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(60)).unwrap();
        cache.put("old", "1");
        sleep(Duration::from_secs(30)).await;
        cache.put("new", "2");

        // "old" is exactly one interval old here
        let boundary = Instant::now() + Duration::from_secs(30);
        assert_eq!(cache.shared.sweep(boundary), 0);
        assert!(cache.get("old").is_some());

        let removed = cache.shared.sweep(boundary + Duration::from_millis(1));

        assert_eq!(removed, 1);
        assert!(cache.get("old").is_none());
        assert!(cache.get("new").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_does_not_check_staleness() {
        let interval = Duration::from_secs(5);
        let (cache, reaper) = ExpiringCache::with_reaper(interval).unwrap();
        reaper.abort();
        cache.put("u1", "stale");

        sleep(interval * 3).await;

        assert_eq!(cache.get("u1").as_deref(), Some(&b"stale"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_stops_when_last_handle_dropped() {
        let (cache, reaper) = ExpiringCache::with_reaper(Duration::from_secs(1)).unwrap();
        let clone = cache.clone();

        drop(cache);
        sleep(Duration::from_secs(3)).await;
        assert!(!reaper.is_finished());

        drop(clone);
        tokio::time::timeout(Duration::from_secs(5), reaper)
            .await
            .expect("reaper should exit after the cache is dropped")
            .expect("reaper should not panic");
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(5)).unwrap();
        let clone = cache.clone();
        clone.put("shared", "yes");

        assert_eq!(cache.get("shared").as_deref(), Some(&b"yes"[..]));
        assert_eq!(cache.interval(), Duration::from_secs(5));
    }
}
