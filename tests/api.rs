use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use crawltrace::api;
use crawltrace::common::config::CrawlerConfig;
use crawltrace::crawler::Crawler;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> CrawlerConfig {
    let mut config = crawltrace::common::config::Config::default().crawler;
    config.quiescence_seconds = 1;
    config.timeout_seconds = 5;
    config
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Scenario 1: POSTing without a `Content-Type: application/json` header is
/// rejected before the crawl is ever attempted.
#[tokio::test]
async fn content_type_gate_rejects_missing_header() {
    let crawler = Arc::new(Crawler::new(test_config()));
    let app = api::router(crawler, false);

    let request = Request::builder()
        .method("POST")
        .uri("/api/domains")
        .body(Body::from(
            json!({"domain": "https://example.com", "depth": 1}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

/// Scenario 2: a malformed seed URL fails `Crawler::crawl`'s parse step and
/// is surfaced as 400.
#[tokio::test]
async fn malformed_seed_is_rejected() {
    let crawler = Arc::new(Crawler::new(test_config()));
    let app = api::router(crawler, false);

    let request = Request::builder()
        .method("POST")
        .uri("/api/domains")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"domain": "htt://example.com", "depth": 1}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Scenarios 3-5: a valid seed registers, is immediately queryable as
/// initialised/in-progress, and its tree is not yet servable.
#[tokio::test]
async fn happy_path_register_then_query_before_completion() {
    let mut server = mockito::Server::new_async().await;
    let _robots_mock = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nAllow: /")
        .expect_at_least(1)
        .create_async()
        .await;
    let _page_mock = server
        .mock("HEAD", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .create_async()
        .await;
    let _get_mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><head><title>Home</title></head><body></body></html>")
        .create_async()
        .await;

    let domain = server.url();
    let crawler = Arc::new(Crawler::new(test_config()));
    let app = api::router(crawler, false);

    let register_request = Request::builder()
        .method("POST")
        .uri("/api/domains")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"domain": domain, "depth": 1}).to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(register_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["domain"], json!(format!("{domain}/")));
    assert_eq!(body["depth"], json!(1));
    assert_eq!(body["status"], json!("initialised"));

    let registered_key = format!("{domain}/");
    let encoded = urlencoding::encode(&registered_key);

    let status_request = Request::builder()
        .method("GET")
        .uri(format!("/api/domains/{encoded}/status"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(status_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let status = body["status"].as_str().unwrap();
    assert!(status == "initialised" || status == "in-progress");

    let tree_request = Request::builder()
        .method("GET")
        .uri(format!("/api/domains/{encoded}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(tree_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Scenario 6: querying a domain that was never posted returns 404.
#[tokio::test]
async fn unknown_domain_status_is_not_found() {
    let crawler = Arc::new(Crawler::new(test_config()));
    let app = api::router(crawler, false);

    let request = Request::builder()
        .method("GET")
        .uri("/api/domains/https%3A%2F%2Funknown.test/status")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Posting the same domain twice yields 202 then 400 (duplicate registration).
#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _robots_mock = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nAllow: /")
        .expect_at_least(1)
        .create_async()
        .await;

    let domain = server.url();
    let crawler = Arc::new(Crawler::new(test_config()));
    let app = api::router(crawler, false);

    let build_request = || {
        Request::builder()
            .method("POST")
            .uri("/api/domains")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"domain": domain, "depth": 1}).to_string(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(build_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app.clone().oneshot(build_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
