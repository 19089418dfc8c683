use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ipstack_client::GeoClient;
use ipstack_core::{GeoProvider, LookupError, QueryParams};

async fn client_for(server: &MockServer, api_key: &str) -> GeoClient {
    GeoClient::new(&format!("{}/", server.uri()), api_key)
}

// ============================================================
// BDD: A plain payload is returned unchanged
// ============================================================
#[tokio::test]
async fn test_valid_request_returns_provider_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/8.8.4.4"))
        .and(query_param("output", "json"))
        .and(query_param("access_key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "8.8.4.4",
            "country_code": "US",
            "country_name": "United States",
            "latitude": 37.751,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "secret").await;
    let result = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect("lookup");

    assert_eq!(result.get("ip"), Some(&json!("8.8.4.4")));
    assert_eq!(result.get("country_code"), Some(&json!("US")));
    assert_eq!(result.get("country_name"), Some(&json!("United States")));
    assert_eq!(result.get("latitude"), Some(&json!(37.751)));
}

// ============================================================
// BDD: Caller parameters are sent and override the defaults
// ============================================================
#[tokio::test]
async fn test_custom_query_params_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1.1.1"))
        .and(query_param("access_key", "override"))
        .and(query_param("fields", "ip,country_code"))
        .and(query_param("language", "de"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "1.1.1.1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "secret").await;
    let mut query = QueryParams::new();
    query.insert("access_key".to_string(), "override".to_string());
    query.insert("fields".to_string(), "ip,country_code".to_string());
    query.insert("language".to_string(), "de".to_string());

    let result = client.get("1.1.1.1", &query).await.expect("lookup");
    assert_eq!(result.get("ip"), Some(&json!("1.1.1.1")));
}

// ============================================================
// BDD: The error envelope becomes a response failure
// ============================================================
#[tokio::test]
async fn test_error_envelope_raises_response_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {
                "code": 101,
                "type": "invalid_access_key",
                "info": "You have not supplied a valid API Access Key."
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, "wrong").await;
    let err = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect_err("error envelope");

    match &err {
        LookupError::Response { code, .. } => assert_eq!(*code, 101),
        other => panic!("expected response failure, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "invalid_access_key: You have not supplied a valid API Access Key."
    );
}

// ============================================================
// BDD: Transport-level problems become request failures
// ============================================================
#[tokio::test]
async fn test_server_error_status_raises_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, "secret").await;
    let err = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect_err("503");
    assert!(matches!(err, LookupError::Request { .. }), "{err:?}");
}

#[tokio::test]
async fn test_unreachable_endpoint_raises_request_failure() {
    let client = GeoClient::new("http://127.0.0.1:1/", "secret");
    let err = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, LookupError::Request { .. }), "{err:?}");
    assert_eq!(err.code(), 0);
}

#[tokio::test]
async fn test_malformed_body_raises_response_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, "secret").await;
    let err = client
        .get("8.8.4.4", &QueryParams::new())
        .await
        .expect_err("malformed body");
    assert!(matches!(err, LookupError::Response { code: 0, .. }), "{err:?}");
}
