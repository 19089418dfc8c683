use axum::{extract::Request, Json};
use serde_json::{json, Value};

use crate::request::AttributeExt;

/// `GET /api/whoami`: echo the attributes the geolocation middleware attached.
///
/// Runs behind [`GeoIpLayer`](crate::middleware::GeoIpLayer), so a request
/// without a valid client IP never gets here.
pub async fn whoami(request: Request) -> Json<Value> {
    let attributes = request.attributes().cloned().unwrap_or_default();
    Json(json!({ "attributes": attributes }))
}
