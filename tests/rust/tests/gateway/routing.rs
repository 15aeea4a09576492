//! Routing and backend invocation tests

use axum::http::{header, StatusCode};
use serde_json::json;
use tests::mocks::{HeaderAbsent, HeaderPresent};
use tests::{body_json, TestGateway};
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn health_endpoint_is_not_routed_to_backends() {
    let gateway = TestGateway::builder().build();

    let response = gateway.get("/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn unroutable_path_returns_gateway_error_envelope() {
    let gateway = TestGateway::builder().build();

    let response = gateway.get("/unknown/things/1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // CORS headers are attached to error responses too.
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("NO_BACKEND_FOUND"));
    assert!(body["error"]["message"].as_str().unwrap().contains("/unknown/things/1"));
}

#[tokio::test]
async fn backend_http_errors_pass_through_verbatim() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/taxpayer/taxpayers/MISSING"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "no such taxpayer"})),
        )
        .mount(&backend)
        .await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &backend.uri())
        .build();

    let response = gateway.get("/taxpayer/taxpayers/MISSING").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    // The backend's own body, not a gateway envelope.
    assert_eq!(body, json!({"error": "no such taxpayer"}));
}

#[tokio::test]
async fn unreachable_backend_is_a_gateway_upstream_error() {
    // Nothing listens here.
    let gateway = TestGateway::builder()
        .backend("taxpayer", "http://127.0.0.1:1")
        .build();

    let response = gateway.get("/taxpayer/taxpayers/TP1").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("UPSTREAM_ERROR"));
    assert!(body["error"]["detail"].is_string());
}

#[tokio::test]
async fn plural_alias_routes_to_the_same_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/taxpayers/TP1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "TP1"})))
        .mount(&backend)
        .await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &backend.uri())
        .build();

    let response = gateway.get("/taxpayers/TP1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_allow_listed_headers_are_forwarded() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/taxpayer/taxpayers/TP1"))
        .and(header_eq("authorization", "Bearer token-123"))
        .and(HeaderPresent("x-request-id"))
        .and(HeaderAbsent("cookie"))
        .and(HeaderAbsent("x-internal-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "TP1"})))
        .expect(1)
        .mount(&backend)
        .await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &backend.uri())
        .build();

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/taxpayer/taxpayers/TP1")
        .header("authorization", "Bearer token-123")
        .header("cookie", "session=abc")
        .header("x-internal-secret", "do-not-forward")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = gateway.oneshot(request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn post_bodies_are_forwarded_and_created_status_is_preserved() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/taxpayer/taxpayers"))
        .and(header_eq("content-type", "application/json"))
        .and(wiremock::matchers::body_json(json!({"name": "New taxpayer"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "TP999", "name": "New taxpayer"})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &backend.uri())
        .build();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/taxpayer/taxpayers")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"name": "New taxpayer"}"#))
        .unwrap();
    let response = gateway.oneshot(request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], json!("TP999"));
}

#[tokio::test]
async fn options_preflight_succeeds_without_touching_backends() {
    let gateway = TestGateway::builder().build();

    let response = gateway.request("OPTIONS", "/taxpayer/taxpayers/TP1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let allow_headers = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(allow_headers.contains("Accept"));
}
