// Integration tests for `TelemetryClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use indexmap::IndexMap;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use espfleet_api::{Error, TelemetryClient, TelemetryConfig, TrackingHit};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TelemetryClient) {
    let server = MockServer::start().await;
    let config = TelemetryConfig {
        base_url: server.uri().parse().unwrap(),
        site_id: 2,
        app_id: "nl.joolee.espeasy".into(),
        initial_timeout: Duration::from_secs(1800),
    };
    let client = TelemetryClient::from_reqwest(config, reqwest::Client::new());
    (server, client)
}

fn initialized_hit() -> TrackingHit {
    let mut metrics = IndexMap::new();
    metrics.insert("Total tasks".to_string(), 5);
    metrics.insert("Total tasks in use".to_string(), 1);
    TrackingHit {
        category: "App".into(),
        reason: "Initialized".into(),
        route: "/app/initialized".into(),
        metrics,
    }
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_deliver_sends_tracking_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/matomo.php"))
        .and(query_param("idsite", "2"))
        .and(query_param("rec", "1"))
        .and(query_param("e_c", "App"))
        .and(query_param("e_a", "Initialized"))
        .and(query_param("action_name", "App/Initialized"))
        .and(query_param("url", "app://nl.joolee.espeasy/app/initialized"))
        .and(query_param("_id", client.visitor_id()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.deliver(&initialized_hit()).await.unwrap();
}

#[tokio::test]
async fn test_deliver_encodes_metrics_as_custom_variables() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/matomo.php"))
        .and(query_param(
            "cvar",
            r#"{"1":["Total tasks","5"],"2":["Total tasks in use","1"]}"#,
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.deliver(&initialized_hit()).await.unwrap();
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/matomo.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.deliver(&initialized_hit()).await.unwrap_err();
    assert!(matches!(err, Error::Rejected { status: 503 }));
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_client_error_keeps_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/matomo.php"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let err = client.deliver(&initialized_hit()).await.unwrap_err();
    assert!(matches!(err, Error::Rejected { status: 400 }));
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_unreachable_tracker_is_transport_error() {
    let config = TelemetryConfig {
        base_url: "http://127.0.0.1:9".parse().unwrap(),
        site_id: 2,
        app_id: "nl.joolee.espeasy".into(),
        initial_timeout: Duration::from_secs(1800),
    };
    let client = TelemetryClient::from_reqwest(config, reqwest::Client::new());

    let err = client.deliver(&initialized_hit()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
