use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use ipstack_cache::{CacheStore, CachingGeoClient, MemoryCacheStore};
use ipstack_core::cache_key::cache_key;
use ipstack_core::{GeoProvider, LookupError, LookupResult, QueryParams};

/// Provider that counts calls and answers with a fixed payload per IP.
struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl GeoProvider for CountingProvider {
    async fn get(&self, ip: &str, _query: &QueryParams) -> Result<LookupResult, LookupError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let mut result = LookupResult::new();
        result.insert("ip", ip);
        result.insert("country_code", "US");
        result.insert("country_name", "United States");
        result.insert("call", n as u64);
        result.insert("latitude", 37.751);
        Ok(result)
    }
}

struct FailingProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl GeoProvider for FailingProvider {
    async fn get(&self, _ip: &str, _query: &QueryParams) -> Result<LookupResult, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LookupError::response("usage_limit_reached: monthly limit", 104))
    }
}

/// Store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<LookupResult>> {
        anyhow::bail!("disk on fire")
    }
    async fn set(
        &self,
        _key: &str,
        _value: LookupResult,
        _ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("disk on fire")
    }
    async fn contains(&self, _key: &str) -> anyhow::Result<bool> {
        anyhow::bail!("disk on fire")
    }
}

fn counting() -> (CountingProvider, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
        CountingProvider {
            calls: Arc::clone(&calls),
        },
        calls,
    )
}

// ============================================================
// BDD: Second lookup for the same IP is served from cache
// ============================================================
#[tokio::test]
async fn test_second_call_is_served_from_cache() {
    let (provider, calls) = counting();
    let store = Arc::new(MemoryCacheStore::new());
    let client = CachingGeoClient::new(provider, store.clone());

    let first = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect("first lookup");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.contains(&cache_key("8.8.4.4")).await.expect("contains"));

    let second = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect("second lookup");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "provider must not be asked again");
    assert_eq!(first, second);
    assert_eq!(
        first.encode().expect("encode"),
        second.encode().expect("encode")
    );
}

#[tokio::test]
async fn test_different_ips_are_cached_separately() {
    let (provider, calls) = counting();
    let store = Arc::new(MemoryCacheStore::new());
    let client = CachingGeoClient::new(provider, store.clone());

    let a = client.get("8.8.4.4", &QueryParams::new()).await.expect("a");
    let b = client.get("2001:db8::1", &QueryParams::new()).await.expect("b");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.get("ip"), Some(&json!("8.8.4.4")));
    assert_eq!(b.get("ip"), Some(&json!("2001:db8::1")));
    assert_eq!(store.len().await, 2);
}

// ============================================================
// BDD: Provider failures propagate and are not cached
// ============================================================
#[tokio::test]
async fn test_provider_failure_propagates_and_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryCacheStore::new());
    let client = CachingGeoClient::new(
        FailingProvider {
            calls: Arc::clone(&calls),
        },
        store.clone(),
    );

    for _ in 0..2 {
        let err = client
            .get("8.8.4.4", &QueryParams::new())
            .await
            .expect_err("provider failure");
        assert_eq!(err.code(), 104);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(store.is_empty().await);
}

// ============================================================
// BDD: Configured lifetime is applied to stored entries
// ============================================================
#[tokio::test(start_paused = true)]
async fn test_cache_lifetime_expires_entries() {
    let (provider, calls) = counting();
    let store = Arc::new(MemoryCacheStore::new());
    let mut client = CachingGeoClient::new(provider, store.clone());
    client.set_cache_lifetime(Some(Duration::from_secs(60)));

    client.get("8.8.4.4", &QueryParams::new()).await.expect("miss");
    tokio::time::advance(Duration::from_secs(30)).await;
    client.get("8.8.4.4", &QueryParams::new()).await.expect("hit");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    let refreshed = client.get("8.8.4.4", &QueryParams::new()).await.expect("miss again");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed.get("call"), Some(&json!(1)));
}

#[tokio::test(start_paused = true)]
async fn test_no_lifetime_means_entries_stay() {
    let (provider, calls) = counting();
    let client = CachingGeoClient::new(provider, Arc::new(MemoryCacheStore::new()));
    assert_eq!(client.cache_lifetime(), None);

    client.get("8.8.4.4", &QueryParams::new()).await.expect("miss");
    tokio::time::advance(Duration::from_secs(30 * 24 * 3600)).await;
    client.get("8.8.4.4", &QueryParams::new()).await.expect("hit");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_huge_lifetime_is_cached_without_expiry() {
    let (provider, calls) = counting();
    let store = Arc::new(MemoryCacheStore::new());
    let mut client = CachingGeoClient::new(provider, store.clone());
    client.set_cache_lifetime(Some(Duration::MAX));

    let first = client.get("8.8.4.4", &QueryParams::new()).await.expect("miss");
    assert_eq!(first.get("country_code"), Some(&json!("US")));
    assert!(store.contains(&cache_key("8.8.4.4")).await.expect("contains"));

    tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
    client.get("8.8.4.4", &QueryParams::new()).await.expect("hit");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================
// BDD: A broken store degrades to pass-through
// ============================================================
#[tokio::test]
async fn test_broken_store_falls_back_to_provider() {
    let (provider, calls) = counting();
    let client = CachingGeoClient::new(provider, Arc::new(BrokenStore));

    let result = client.get("8.8.4.4", &QueryParams::new()).await.expect("lookup");
    assert_eq!(result.get("country_code"), Some(&json!("US")));
    client.get("8.8.4.4", &QueryParams::new()).await.expect("lookup");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
