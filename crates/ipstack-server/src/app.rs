use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{request, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer`: structured request/response logging via `tracing`.
/// 2. `server_params`: copies the peer address into `ServerParams`.
/// 3. `GeoIpLayer`: only on the `/api/whoami` group; rejects requests
///    without a valid client IP and attaches geolocation attributes.
pub fn build_app(state: Arc<AppState>) -> Router {
    let located: Router<Arc<AppState>> = Router::new()
        .route("/api/whoami", get(routes::whoami::whoami))
        .layer(state.geoip.layer());

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/lookup/{ip}", get(routes::lookup::lookup))
        .merge(located)
        .layer(middleware::from_fn(request::server_params))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
