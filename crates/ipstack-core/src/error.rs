use thiserror::Error;

/// Failure of a single geolocation lookup.
///
/// Both variants travel through every provider layer unchanged; callers that
/// only care whether a lookup failed can match on `LookupError` as a whole.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The HTTP exchange itself did not complete: DNS, connect, timeout,
    /// transport error or a non-success HTTP status.
    #[error("request failed: {message}")]
    Request {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider answered, but its payload signals an application error.
    #[error("{message}")]
    Response { message: String, code: i64 },
}

impl LookupError {
    pub fn request(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LookupError::Request {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn response(message: impl Into<String>, code: i64) -> Self {
        LookupError::Response {
            message: message.into(),
            code,
        }
    }

    /// Provider error code; `0` for transport failures.
    pub fn code(&self) -> i64 {
        match self {
            LookupError::Request { .. } => 0,
            LookupError::Response { code, .. } => *code,
        }
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::Request { .. } => "request",
            LookupError::Response { .. } => "response",
        }
    }
}
