use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use ipstack_core::{
    cache_key::cache_key, event_at, level::LogLevel, GeoProvider, LookupError, LookupResult,
    QueryParams,
};

use crate::store::CacheStore;

/// Caching wrapper around any [`GeoProvider`].
///
/// Results are stored under `sha256(ip)`. The wrapped provider is only asked
/// on a miss; its errors are returned unchanged and never cached. Cache store
/// failures degrade to a miss (on read) or an unstored result (on write).
///
/// The cache key ignores the extra query parameters: whichever field set was
/// requested first is what later hits for the same IP return.
pub struct CachingGeoClient<P> {
    inner: P,
    cache: Arc<dyn CacheStore>,
    cache_lifetime: Option<Duration>,
    log_level: LogLevel,
}

impl<P: GeoProvider> CachingGeoClient<P> {
    pub fn new(inner: P, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            cache,
            cache_lifetime: None,
            log_level: LogLevel::Info,
        }
    }

    /// Level for the "found in cache" / "written to cache" events.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_cache_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.cache_lifetime = lifetime;
        self
    }

    /// Lifetime for entries written from now on. `None` defers to the store.
    pub fn set_cache_lifetime(&mut self, lifetime: Option<Duration>) -> &mut Self {
        self.cache_lifetime = lifetime;
        self
    }

    pub fn cache_lifetime(&self) -> Option<Duration> {
        self.cache_lifetime
    }

    async fn cached(&self, key: &str, ip: &str) -> Option<LookupResult> {
        match self.cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(client_ip = %ip, error = %e, "ipstack cache read failed, treating as miss");
                None
            }
        }
    }
}

#[async_trait]
impl<P: GeoProvider> GeoProvider for CachingGeoClient<P> {
    async fn get(&self, ip: &str, query: &QueryParams) -> Result<LookupResult, LookupError> {
        let key = cache_key(ip);

        if let Some(hit) = self.cached(&key, ip).await {
            event_at!(
                self.log_level,
                client_ip = %ip,
                key = %key,
                fields = hit.len(),
                "Found ipstack info in cache"
            );
            return Ok(hit);
        }

        debug!(client_ip = %ip, key = %key, "No ipstack info in cache");
        let fresh = self.inner.get(ip, query).await?;

        let lifetime = self.cache_lifetime;
        match self.cache.set(&key, fresh.clone(), lifetime).await {
            Ok(()) => {
                event_at!(
                    self.log_level,
                    client_ip = %ip,
                    key = %key,
                    ttl_secs = ?lifetime.map(|d| d.as_secs()),
                    "Write ipstack info to cache"
                );
            }
            Err(e) => {
                warn!(client_ip = %ip, key = %key, error = %e, "ipstack cache write failed");
            }
        }

        Ok(fresh)
    }
}
