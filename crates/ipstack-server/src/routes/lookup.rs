use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use ipstack_core::{ip::is_valid_ip, GeoProvider, QueryParams};

use crate::{error::AppError, state::AppState};

/// `GET /api/lookup/{ip}`: look up an arbitrary IP through the cached provider.
///
/// Unlike the middleware this does not degrade: a provider failure is a
/// `502` with the provider's message.
#[tracing::instrument(skip(state))]
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path(ip): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_ip(&ip) {
        return Err(AppError::BadRequest(format!("not an IP address: {ip}")));
    }

    let mut query = QueryParams::new();
    if let Some(language) = &state.config.language {
        query.insert("language".to_string(), language.clone());
    }

    let result = state.provider.get(&ip, &query).await?;
    Ok(Json(result))
}
