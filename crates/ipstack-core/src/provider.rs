use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::LookupError, lookup::LookupResult, lookup::QueryParams};

/// Anything that can answer "where is this IP?".
///
/// Implemented by the HTTP client and by the caching decorator, so the
/// middleware never knows which one it is talking to.
#[async_trait]
pub trait GeoProvider: Send + Sync + 'static {
    async fn get(&self, ip: &str, query: &QueryParams) -> Result<LookupResult, LookupError>;
}

#[async_trait]
impl<P: GeoProvider + ?Sized> GeoProvider for Arc<P> {
    async fn get(&self, ip: &str, query: &QueryParams) -> Result<LookupResult, LookupError> {
        (**self).get(ip, query).await
    }
}
