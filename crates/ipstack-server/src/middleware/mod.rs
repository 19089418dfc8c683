//! Client geolocation middleware.
//!
//! Finds the client IP (from a request attribute set by an earlier stage, or
//! from `REMOTE_ADDR`), asks a [`GeoProvider`] about it and stores the answer
//! as request attributes. Requests without a usable IP are answered with a
//! bare status response and never reach the downstream handler.
//!
//! Two calling conventions share one orchestration step, [`GeoIpMiddleware::process`]:
//! the tower [`GeoIpLayer`] for handler-object style stacks, and
//! [`GeoIpMiddleware::invoke`] for `(request, response, next)` style chains.

mod layer;

use std::future::Future;
use std::sync::Arc;

use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use ipstack_core::{
    event_at,
    ip::{ip_family, IpFamily},
    level::LogLevel,
    GeoProvider, LookupResult, QueryParams,
};

use crate::config::Config;
use crate::request::{AttributeExt, REMOTE_ADDR};

pub use layer::{GeoIpLayer, GeoIpService};

/// Fields requested on every lookup, and the only ones that get logged.
pub const DEFAULT_FIELDS: [&str; 3] = ["ip", "country_code", "country_name"];

#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    /// Provider field → request attribute name.
    pub attributes: Vec<(String, String)>,
    pub default_fields: Vec<String>,
    /// Attribute holding the client IP; `None` or empty reads `REMOTE_ADDR`.
    pub ip_attribute: Option<String>,
    /// Attribute receiving the full lookup result.
    pub result_attribute: String,
    pub error_status: StatusCode,
    pub language: Option<String>,
    pub success_level: LogLevel,
    pub invalid_ip_level: LogLevel,
    pub provider_error_level: LogLevel,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            default_fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            ip_attribute: None,
            result_attribute: "ipstack".to_string(),
            error_status: StatusCode::BAD_REQUEST,
            language: Some("de".to_string()),
            success_level: LogLevel::Notice,
            invalid_ip_level: LogLevel::Error,
            provider_error_level: LogLevel::Error,
        }
    }
}

impl GeoIpConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attributes: config.attributes.clone(),
            ip_attribute: config.ip_attribute.clone(),
            result_attribute: config.result_attribute.clone(),
            error_status: StatusCode::from_u16(config.error_status)
                .unwrap_or(StatusCode::BAD_REQUEST),
            language: config.language.clone(),
            success_level: config.success_log_level,
            invalid_ip_level: config.invalid_ip_log_level,
            provider_error_level: config.provider_error_log_level,
            ..Self::default()
        }
    }
}

/// Result of running the middleware over one request.
#[derive(Debug)]
pub enum Outcome<B> {
    /// Attributes attached; hand the request on.
    Proceed(Request<B>),
    /// No usable client IP; answer with this status.
    Reject(StatusCode),
}

#[derive(Clone)]
pub struct GeoIpMiddleware {
    provider: Arc<dyn GeoProvider>,
    config: Arc<GeoIpConfig>,
}

impl GeoIpMiddleware {
    pub fn new(provider: Arc<dyn GeoProvider>, config: GeoIpConfig) -> Self {
        Self {
            provider,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GeoIpConfig {
        &self.config
    }

    pub fn layer(&self) -> GeoIpLayer {
        GeoIpLayer::new(self.clone())
    }

    /// `(request, response, next)` convention.
    ///
    /// On rejection `response` is returned with its status replaced and
    /// `next` is dropped uncalled.
    pub async fn invoke<B, R, F, Fut>(
        &self,
        request: Request<B>,
        mut response: Response<R>,
        next: F,
    ) -> Response<R>
    where
        F: FnOnce(Request<B>, Response<R>) -> Fut,
        Fut: Future<Output = Response<R>>,
    {
        match self.process(request).await {
            Outcome::Proceed(request) => next(request, response).await,
            Outcome::Reject(status) => {
                *response.status_mut() = status;
                response
            }
        }
    }

    /// Extract, validate, look up and attach.
    pub async fn process<B>(&self, request: Request<B>) -> Outcome<B> {
        let client_ip = self.client_ip(&request);

        if !self.assert_client_ip(&client_ip) {
            event_at!(
                self.config.invalid_ip_level,
                status = self.config.error_status.as_u16(),
                "Could not determine client IP, force status '{}' response",
                self.config.error_status.as_u16()
            );
            return Outcome::Reject(self.config.error_status);
        }

        let result = self.lookup(&client_ip).await;
        Outcome::Proceed(self.attach(request, result))
    }

    /// Client IP from the configured attribute, else from `REMOTE_ADDR`.
    /// Missing or non-string values yield an empty string.
    pub fn client_ip<B>(&self, request: &Request<B>) -> String {
        let (client_ip, source) = match self.config.ip_attribute.as_deref() {
            Some(name) if !name.is_empty() => (
                request
                    .attribute(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
                name,
            ),
            _ => (request.server_param(REMOTE_ADDR).unwrap_or_default(), REMOTE_ADDR),
        };

        debug!(src = source, client_ip, "Use client IP");
        client_ip.to_string()
    }

    /// `true` for a non-empty IPv4 or IPv6 literal.
    pub fn assert_client_ip(&self, client_ip: &str) -> bool {
        if client_ip.is_empty() {
            error!("Empty client IP");
            return false;
        }

        match ip_family(client_ip) {
            Some(IpFamily::V4) => {
                debug!(client_ip, "Valid IPv4 address");
                true
            }
            Some(IpFamily::V6) => {
                debug!(client_ip, "Valid IPv6 address");
                true
            }
            None => {
                warn!(client_ip, "Client IP is neither IPv4 nor IPv6");
                false
            }
        }
    }

    /// Mapped fields first, then the defaults, without duplicates.
    pub fn requested_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        let candidates = self
            .config
            .attributes
            .iter()
            .map(|(field, _)| field)
            .chain(self.config.default_fields.iter());
        for field in candidates {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        fields
    }

    /// Ask the provider; on failure fall back to all-null fields plus `ip`.
    pub async fn lookup(&self, client_ip: &str) -> LookupResult {
        let fields = self.requested_fields();

        let mut defaults = LookupResult::with_fields(fields.iter().cloned());
        defaults.insert("ip", client_ip);

        let mut query = QueryParams::new();
        query.insert("fields".to_string(), fields.join(","));
        if let Some(language) = &self.config.language {
            query.insert("language".to_string(), language.clone());
        }

        match self.provider.get(client_ip, &query).await {
            Ok(answer) => {
                let result = defaults.merge(answer);
                event_at!(
                    self.config.success_level,
                    client_ip = %result.get_or_null("ip"),
                    country_code = %result.get_or_null("country_code"),
                    country_name = %result.get_or_null("country_name"),
                    "Success: ipstack response"
                );
                result
            }
            Err(e) => {
                event_at!(
                    self.config.provider_error_level,
                    client_ip,
                    kind = e.kind(),
                    code = e.code(),
                    error = %e,
                    "Asking ipstack failed"
                );
                defaults
            }
        }
    }

    /// Store the result and each mapped field as request attributes.
    pub fn attach<B>(&self, request: Request<B>, result: LookupResult) -> Request<B> {
        let mapped: Vec<(&str, Value)> = self
            .config
            .attributes
            .iter()
            .map(|(field, attribute)| (attribute.as_str(), result.get_or_null(field)))
            .collect();

        let mut request = request.with_attribute(&self.config.result_attribute, result);
        for (attribute, value) in mapped {
            request = request.with_attribute(attribute, value);
        }
        request
    }
}
