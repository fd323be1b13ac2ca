#![allow(clippy::unwrap_used)]
// Integration tests for `CheckClient` using wiremock.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use checkpoint_api::{CheckAlert, CheckClient, CheckQuery, CheckResponse, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CheckClient) {
    let server = MockServer::start().await;
    let client = CheckClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn query() -> CheckQuery {
    CheckQuery {
        version: "1.0".into(),
        arch: "x86_64".into(),
        os: "linux".into(),
        signature: "sig".into(),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_check_decodes_response() {
    let (server, client) = setup().await;

    let body = json!({
        "product": "test",
        "current_version": "1.0.2",
        "current_release_date": 1_700_000_000,
        "current_download_url": "http://www.example.com/",
        "current_changelog_url": "http://www.example.com/changelog",
        "project_website": "http://www.example.com",
        "outdated": true,
        "alerts": [{
            "id": 7,
            "date": 1_700_000_100,
            "message": "critical fix available",
            "url": "http://www.example.com/alerts/7",
            "level": "crit"
        }]
    });

    Mock::given(method("GET"))
        .and(path("/v1/check/test"))
        .and(query_param("version", "1.0"))
        .and(query_param("arch", "x86_64"))
        .and(query_param("os", "linux"))
        .and(query_param("signature", "sig"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.check("test", &query(), None).await.unwrap();

    assert_eq!(
        resp,
        CheckResponse {
            product: "test".into(),
            current_version: "1.0.2".into(),
            current_release_date: 1_700_000_000,
            current_download_url: "http://www.example.com/".into(),
            current_changelog_url: "http://www.example.com/changelog".into(),
            project_website: "http://www.example.com".into(),
            outdated: true,
            alerts: vec![CheckAlert {
                id: 7,
                date: 1_700_000_100,
                message: "critical fix available".into(),
                url: "http://www.example.com/alerts/7".into(),
                level: "crit".into(),
            }],
        }
    );
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_non_200_is_unexpected_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/check/test"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client.check("test", &query(), None).await;

    assert!(
        matches!(result, Err(Error::UnexpectedStatus { status: 503 })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
    assert!(result.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/check/test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.check("test", &query(), None).await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_per_request_timeout_overrides_client() {
    // Accept connections but never answer them.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap();
    let client = CheckClient::from_reqwest(&format!("http://{addr}"), http).unwrap();

    let started = Instant::now();
    let result = client
        .check("test", &query(), Some(Duration::from_millis(50)))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_timeout(), "expected a timeout, got: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}
