use std::sync::Arc;

use ipstack_cache::{CachingGeoClient, MemoryCacheStore};
use ipstack_client::GeoClient;
use ipstack_core::{config::Config, GeoProvider};

use crate::middleware::{GeoIpConfig, GeoIpMiddleware};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// The provider every lookup goes through (normally the cached client).
    pub provider: Arc<dyn GeoProvider>,

    /// Geolocation middleware sharing `provider`.
    pub geoip: GeoIpMiddleware,
}

impl AppState {
    /// Construct a new `AppState` around `provider`; middleware settings come
    /// from `config`.
    pub fn new(provider: Arc<dyn GeoProvider>, config: Config) -> Self {
        let geoip = GeoIpMiddleware::new(Arc::clone(&provider), GeoIpConfig::from_config(&config));
        Self {
            config: Arc::new(config),
            provider,
            geoip,
        }
    }
}

/// The production provider: ipstack HTTP client behind an in-memory cache.
pub fn build_provider(config: &Config) -> Arc<dyn GeoProvider> {
    let client = GeoClient::with_timeout(&config.endpoint, &config.api_key, config.http_timeout());
    let cached = CachingGeoClient::new(client, Arc::new(MemoryCacheStore::new()))
        .with_cache_lifetime(config.cache_ttl())
        .with_log_level(config.cache_log_level);
    Arc::new(cached)
}
