//! HTTP retrieval tests against a local mock server.
//!
//! The ingestor uses a blocking client, so each call runs on a blocking
//! thread while the mock server lives on the async runtime.

use std::fs;
use std::path::Path;

use cadastre_ingest::config::{HttpConfig, IngestConfig};
use cadastre_ingest::{IngestError, IngestOutcome, Ingestor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn config_with_http(http: HttpConfig) -> IngestConfig {
    IngestConfig {
        http,
        ..IngestConfig::default()
    }
}

fn unavailable_reason(err: IngestError) -> String {
    match err {
        IngestError::ResourceUnavailable { reason, .. } => reason,
        other => panic!("expected ResourceUnavailable, got {other}"),
    }
}

async fn fetch(config: IngestConfig, url: String) -> Result<IngestOutcome, IngestError> {
    tokio::task::spawn_blocking(move || Ingestor::new(config).ingest_from_location(&url))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_kml_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kadastro/parcels.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(load_fixture("parcels_plain.kml")))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/kadastro/parcels.kml?rev=3", server.uri());
    let outcome = fetch(IngestConfig::default(), url).await.unwrap();

    assert_eq!(outcome.count, 5);
    assert_eq!(outcome.properties[0].parcel_key(), "12/34");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_geojson_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/parcels.geojson"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(load_fixture("parcels.geojson")))
        .mount(&server)
        .await;

    let url = format!("{}/parcels.geojson", server.uri());
    let outcome = fetch(IngestConfig::default(), url).await.unwrap();
    assert_eq!(outcome.count, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_is_resource_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/13.kmz"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/13.kmz", server.uri());
    let err = fetch(IngestConfig::default(), url.clone()).await.unwrap_err();

    assert!(err.is_resource_unavailable());
    let (location, reason) = match err {
        IngestError::ResourceUnavailable { location, reason } => (location, reason),
        other => panic!("expected ResourceUnavailable, got {other}"),
    };
    assert_eq!(location, url);
    assert!(reason.contains("404"), "unexpected reason: {reason}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/13.kmz"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_with_http(HttpConfig {
        max_retries: 2,
        ..HttpConfig::default()
    });
    let url = format!("{}/13.kmz", server.uri());
    let err = fetch(config, url).await.unwrap_err();

    let reason = unavailable_reason(err);
    assert!(reason.contains("after 2 attempts"), "unexpected reason: {reason}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_response_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/parcels.kml"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(load_fixture("parcels_plain.kml")))
        .mount(&server)
        .await;

    let config = config_with_http(HttpConfig {
        max_response_size: 64,
        ..HttpConfig::default()
    });
    let url = format!("{}/parcels.kml", server.uri());
    let err = fetch(config, url).await.unwrap_err();

    let reason = unavailable_reason(err);
    assert!(reason.contains("too large"), "unexpected reason: {reason}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsupported_remote_name_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/parcels.shp", server.uri());
    let err = fetch(IngestConfig::default(), url).await.unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat(name) if name == "parcels.shp"));
}
