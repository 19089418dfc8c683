use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use ipstack_core::{lookup, GeoProvider, LookupError, LookupResult, QueryParams};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the ipstack "IP to Geolocation" API.
///
/// One lookup is one `GET <endpoint><urlencoded ip>` with `output=json` and
/// the access key in the query string. Caller-supplied parameters are merged
/// over those defaults, so a caller can override either of them.
#[derive(Clone)]
pub struct GeoClient {
    client: Client,
    endpoint: String,
    query_defaults: QueryParams,
}

impl GeoClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self::with_timeout(endpoint, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "HTTP client setup failed, using defaults without timeout");
                Client::new()
            });

        let mut query_defaults = QueryParams::new();
        query_defaults.insert("output".to_string(), "json".to_string());
        query_defaults.insert("access_key".to_string(), api_key.to_string());

        Self {
            client,
            endpoint: endpoint.to_string(),
            query_defaults,
        }
    }

    /// Swap in a preconfigured `reqwest::Client` (proxies, custom TLS, ...).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Defaults overlaid with `custom`; custom values win on collision.
    pub fn build_query(&self, custom: &QueryParams) -> QueryParams {
        let mut query = self.query_defaults.clone();
        query.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
        query
    }

    pub fn lookup_url(&self, ip: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(ip.as_bytes()).collect();
        format!("{}{}", self.endpoint, encoded)
    }

    pub fn decode(body: &str) -> Result<LookupResult, LookupError> {
        lookup::decode(body)
    }
}

#[async_trait]
impl GeoProvider for GeoClient {
    async fn get(&self, ip: &str, query: &QueryParams) -> Result<LookupResult, LookupError> {
        let url = self.lookup_url(ip);
        let query = self.build_query(query);

        debug!(client_ip = %ip, method = "GET", endpoint = %self.endpoint, "Requesting ipstack");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| {
                error!(
                    client_ip = %ip,
                    endpoint = %self.endpoint,
                    error = %e,
                    "ipstack request failed"
                );
                LookupError::request(e.to_string(), e)
            })?;

        let body = response.text().await.map_err(|e| {
            error!(
                client_ip = %ip,
                endpoint = %self.endpoint,
                error = %e,
                "ipstack response body unreadable"
            );
            LookupError::request(e.to_string(), e)
        })?;

        Self::decode(&body).map_err(|e| {
            error!(
                client_ip = %ip,
                endpoint = %self.endpoint,
                code = e.code(),
                error = %e,
                "ipstack responded with an error"
            );
            e
        })
    }
}
