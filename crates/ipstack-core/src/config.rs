use std::time::Duration;

use crate::level::LogLevel;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Provider endpoint; the URL-encoded IP is appended verbatim.
    pub endpoint: String,
    pub api_key: String,
    pub http_timeout_ms: u64,
    /// `None` leaves expiry to the cache store.
    pub cache_ttl_secs: Option<u64>,
    /// Request attribute holding the client IP. `None` reads `REMOTE_ADDR`.
    pub ip_attribute: Option<String>,
    pub result_attribute: String,
    /// Provider field → request attribute, in configuration order.
    pub attributes: Vec<(String, String)>,
    pub error_status: u16,
    /// `language` hint sent with every middleware lookup. `None` omits it.
    pub language: Option<String>,
    pub success_log_level: LogLevel,
    pub invalid_ip_log_level: LogLevel,
    pub provider_error_log_level: LogLevel,
    pub cache_log_level: LogLevel,
}

pub const DEFAULT_ENDPOINT: &str = "http://api.ipstack.com/";

/// Longest accepted cache lifetime: ten years. Leave the variable unset for
/// entries that never expire.
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; `from_env` passes the process
    /// environment.
    pub fn from_vars<F>(var: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: var("IPSTACK_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            endpoint: var("IPSTACK_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: var("IPSTACK_API_KEY")
                .filter(|k| !k.is_empty())
                .ok_or_else(|| "IPSTACK_API_KEY is required".to_string())?,
            http_timeout_ms: var("IPSTACK_HTTP_TIMEOUT_MS")
                .unwrap_or_else(|| "5000".to_string())
                .parse()
                .map_err(|e| format!("invalid IPSTACK_HTTP_TIMEOUT_MS: {e}"))?,
            cache_ttl_secs: match var("IPSTACK_CACHE_TTL_SECS").filter(|v| !v.is_empty()) {
                Some(raw) => {
                    let secs: u64 = raw
                        .parse()
                        .map_err(|e| format!("invalid IPSTACK_CACHE_TTL_SECS: {e}"))?;
                    if secs > MAX_CACHE_TTL_SECS {
                        return Err(format!(
                            "invalid IPSTACK_CACHE_TTL_SECS: {secs} exceeds {MAX_CACHE_TTL_SECS}"
                        ));
                    }
                    Some(secs)
                }
                None => None,
            },
            ip_attribute: var("IPSTACK_IP_ATTRIBUTE").filter(|v| !v.is_empty()),
            result_attribute: var("IPSTACK_RESULT_ATTRIBUTE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "ipstack".to_string()),
            attributes: parse_attribute_map(&var("IPSTACK_ATTRIBUTES").unwrap_or_default())?,
            error_status: {
                let status: u16 = var("IPSTACK_ERROR_STATUS")
                    .unwrap_or_else(|| "400".to_string())
                    .parse()
                    .map_err(|e| format!("invalid IPSTACK_ERROR_STATUS: {e}"))?;
                if !(100..=999).contains(&status) {
                    return Err(format!("invalid IPSTACK_ERROR_STATUS: {status}"));
                }
                status
            },
            language: match var("IPSTACK_LANGUAGE") {
                Some(v) if v.is_empty() => None,
                Some(v) => Some(v),
                None => Some("de".to_string()),
            },
            success_log_level: level(&var, "IPSTACK_SUCCESS_LOG_LEVEL", LogLevel::Notice)?,
            invalid_ip_log_level: level(&var, "IPSTACK_INVALID_IP_LOG_LEVEL", LogLevel::Error)?,
            provider_error_log_level: level(&var, "IPSTACK_ERROR_LOG_LEVEL", LogLevel::Error)?,
            cache_log_level: level(&var, "IPSTACK_CACHE_LOG_LEVEL", LogLevel::Info)?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

fn level<F>(var: &F, name: &str, default: LogLevel) -> Result<LogLevel, String>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|e| format!("invalid {name}: {e}")),
        None => Ok(default),
    }
}

/// Parse `"country_code=X-Country,language=X-Language"` into ordered pairs.
pub fn parse_attribute_map(raw: &str) -> Result<Vec<(String, String)>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (field, attribute) = entry
                .split_once('=')
                .ok_or_else(|| format!("invalid attribute mapping: {entry}"))?;
            let (field, attribute) = (field.trim(), attribute.trim());
            if field.is_empty() || attribute.is_empty() {
                return Err(format!("invalid attribute mapping: {entry}"));
            }
            Ok((field.to_string(), attribute.to_string()))
        })
        .collect()
}
