use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use ipstack_core::LookupResult;

/// Key-value storage for lookup results.
///
/// The decorator only needs get / set / exists. Backends decide how they
/// persist values and how they interpret `ttl: None` (typically "use the
/// store's default lifetime", which may be "never expire").
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Fetch a live entry. Expired entries are reported as a miss.
    async fn get(&self, key: &str) -> anyhow::Result<Option<LookupResult>>;
    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: LookupResult, ttl: Option<Duration>)
        -> anyhow::Result<()>;
    async fn contains(&self, key: &str) -> anyhow::Result<bool>;
}

struct Entry {
    value: LookupResult,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |t| t > now)
    }
}

/// Writes between two sweeps of expired entries.
const SWEEP_INTERVAL: u64 = 64;

/// In-process store backed by a `HashMap` behind a `tokio::sync::RwLock`.
///
/// Expiry is checked on read, and an expired entry found by `get` is removed.
/// Every [`SWEEP_INTERVAL`] writes the whole map is swept, so keys that are
/// never read again are still released. A lifetime too large to represent
/// as an instant is stored without expiry.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
    default_ttl: Option<Duration>,
    writes: AtomicU64,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime applied when `set` is called without one.
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<LookupResult>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Re-check under the write lock; another task may have refreshed it.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: LookupResult,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let now = Instant::now();
        let expires_at = ttl.or(self.default_ttl).and_then(|ttl| now.checked_add(ttl));
        let mut entries = self.entries.write().await;
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            entries.retain(|_, entry| entry.is_live(now));
        }
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn contains(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
