mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{Harness, body_json, body_text, request};
use devmock::{app::create_app, mock::HandlerRegistry, state::AppState};
use serde_json::json;
use tower::ServiceExt;
use url::Url;

fn app(h: &Harness, upstream: Option<&str>) -> axum::Router {
    let state = Arc::new(AppState {
        mock: h.ctx.clone(),
        upstream: upstream.map(|u| Url::parse(u).unwrap()),
        http_client: reqwest::Client::new(),
    });
    create_app(state).unwrap()
}

#[tokio::test]
async fn matched_requests_are_mocked() {
    let h = Harness::new("GET /api/user/:id: {name: mock}\n", HandlerRegistry::new());
    let res = app(&h, None).oneshot(request("GET", "/api/user/7")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!({"name": "mock"}));
}

#[tokio::test]
async fn unmatched_requests_without_upstream_are_not_found() {
    let h = Harness::new("GET /api/user: 1\n", HandlerRegistry::new());
    let res = app(&h, None).oneshot(request("GET", "/api/other")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Not Found");
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let h = Harness::new("GET /api/user: 1\n", HandlerRegistry::new());
    // Port 9 (discard) on loopback is closed in test environments
    let res = app(&h, Some("http://127.0.0.1:9"))
        .oneshot(request("GET", "/api/other"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn health_route_answers_when_not_shadowed() {
    let h = Harness::new("", HandlerRegistry::new());
    let res = app(&h, None).oneshot(request("GET", "/__devmock/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "OK");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let h = Harness::new("GET /a: 1\n", HandlerRegistry::new());

    let res = app(&h, None).oneshot(request("GET", "/a")).await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));

    let req = axum::http::Request::builder()
        .uri("/missing")
        .header("x-request-id", "abc-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app(&h, None).oneshot(req).await.unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}
