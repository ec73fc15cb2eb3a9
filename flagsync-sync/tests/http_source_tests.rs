use flagsync_sync::http::{declared_content_length, API_KEY_HEADER};
use flagsync_sync::{HttpRemoteSource, HttpSourceConfig, RemoteSource, SyncError};
use flagsync_types::{DownloadConfigRequest, IdListCatalogRequest, SdkMetadata};
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer) -> HttpRemoteSource {
    HttpRemoteSource::new(HttpSourceConfig::new(server.uri(), "secret-key")).unwrap()
}

fn config_request(since_time: i64) -> DownloadConfigRequest {
    DownloadConfigRequest {
        since_time,
        statsig_metadata: SdkMetadata::default(),
    }
}

fn catalog_request() -> IdListCatalogRequest {
    IdListCatalogRequest {
        statsig_metadata: SdkMetadata::default(),
    }
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn config_defaults_timeout() {
    let config = HttpSourceConfig::new("https://api.example.com/v1", "k");
    assert_eq!(config.timeout_ms, 30_000);
}

#[test]
fn config_serde_fills_timeout() {
    let config: HttpSourceConfig = serde_json::from_value(json!({
        "api_base_url": "https://api.example.com/v1",
        "server_key": "k"
    }))
    .unwrap();
    assert_eq!(config.timeout_ms, 30_000);
    assert_eq!(config.server_key, "k");
}

// ── download_config_specs ───────────────────────────────────────

#[tokio::test]
async fn snapshot_request_carries_key_and_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download_config_specs"))
        .and(header(API_KEY_HEADER, "secret-key"))
        .and(body_partial_json(json!({
            "sinceTime": 1234,
            "statsigMetadata": { "sdkType": "rust-server" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_updates": true,
            "time": 2000,
            "feature_gates": [{ "name": "g1", "type": "feature_gate", "enabled": true }],
            "dynamic_configs": null,
            "layer_configs": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = assert_ok!(source(&server).fetch_config_snapshot(&config_request(1234)).await);

    assert!(snapshot.has_updates);
    assert_eq!(snapshot.time, 2000);
    assert_eq!(snapshot.feature_gates[0].name, "g1");
    assert!(snapshot.dynamic_configs.is_empty());
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download_config_specs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "has_updates": false, "time": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpSourceConfig::new(format!("{}/", server.uri()), "k");
    let source = HttpRemoteSource::new(config).unwrap();
    let snapshot = assert_ok!(source.fetch_config_snapshot(&config_request(0)).await);
    assert!(!snapshot.has_updates);
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download_config_specs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let err = assert_err!(source(&server).fetch_config_snapshot(&config_request(0)).await);

    match err {
        SyncError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid key");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_snapshot_is_a_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download_config_specs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = assert_err!(source(&server).fetch_config_snapshot(&config_request(0)).await);
    assert!(matches!(err, SyncError::Serialization(_)));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let source = HttpRemoteSource::new(HttpSourceConfig::new("http://127.0.0.1:1", "k")).unwrap();

    let err = assert_err!(source.fetch_config_snapshot(&config_request(0)).await);
    assert!(matches!(err, SyncError::Network(_)));
    assert!(err.is_transport());
}

// ── get_id_lists ────────────────────────────────────────────────

#[tokio::test]
async fn catalog_is_keyed_by_list_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_id_lists"))
        .and(header(API_KEY_HEADER, "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "beta_users": {
                "name": "beta_users",
                "size": 42,
                "creationTime": 1700,
                "url": "https://cdn.example.com/beta_users",
                "fileID": "file_1"
            }
        })))
        .mount(&server)
        .await;

    let catalog = assert_ok!(source(&server).fetch_id_list_catalog(&catalog_request()).await);

    let entry = &catalog["beta_users"];
    assert_eq!(entry.size, 42);
    assert_eq!(entry.creation_time, 1700);
    assert_eq!(entry.file_id, "file_1");
}

#[tokio::test]
async fn null_catalog_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_id_lists"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let catalog = assert_ok!(source(&server).fetch_id_list_catalog(&catalog_request()).await);
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn malformed_catalog_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_id_lists"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&server)
        .await;

    let err = assert_err!(source(&server).fetch_id_list_catalog(&catalog_request()).await);
    assert!(matches!(err, SyncError::Serialization(_)));
}

// ── Range fetches ───────────────────────────────────────────────

#[tokio::test]
async fn range_fetch_requests_open_ended_suffix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/beta"))
        .and(header("range", "bytes=8-"))
        .respond_with(ResponseTemplate::new(206).set_body_string("-a1\n+a3\n"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/lists/beta", server.uri());
    let response = assert_ok!(source(&server).fetch_range(&url, 8).await);

    assert_eq!(response.body, b"-a1\n+a3\n".to_vec());
    assert_eq!(response.content_length, 8);
}

#[tokio::test]
async fn range_fetch_from_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/beta"))
        .and(header("range", "bytes=0-"))
        .respond_with(ResponseTemplate::new(200).set_body_string("+x\n"))
        .mount(&server)
        .await;

    let url = format!("{}/lists/beta", server.uri());
    let response = assert_ok!(source(&server).fetch_range(&url, 0).await);
    assert_eq!(response.content_length, 3);
}

#[tokio::test]
async fn range_fetch_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/lists/gone", server.uri());
    let err = assert_err!(source(&server).fetch_range(&url, 0).await);
    assert!(matches!(err, SyncError::Status { status: 404, .. }));
}

#[test]
fn missing_or_unparsable_content_length_is_zero() {
    let mut headers = HeaderMap::new();
    assert_eq!(declared_content_length(&headers), 0);

    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
    assert_eq!(declared_content_length(&headers), 0);

    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("14"));
    assert_eq!(declared_content_length(&headers), 14);
}
