use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use ipstack_core::LookupError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The geolocation provider could not answer.
    #[error("upstream error: {0}")]
    Upstream(#[from] LookupError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::Upstream(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Upstream lookup failed");
                let code = match e {
                    LookupError::Request { .. } => "upstream_unavailable",
                    LookupError::Response { .. } => "upstream_error",
                };
                (StatusCode::BAD_GATEWAY, code, e.to_string())
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": null
                }
            })),
        )
            .into_response()
    }
}
