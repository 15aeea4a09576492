//! Include aggregation tests
//!
//! Aggregated-mode fan-out: relationship targets are fetched from their
//! owning backends in parallel and embedded under `_included`, with
//! graceful degradation on partial failure.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use tests::{body_json, content_type, TestGateway};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn taxpayer_backend() -> MockServer {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/taxpayer/taxpayers/TP123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "TP123456",
            "name": "A. Taxpayer",
            "_links": {
                "self": "/taxpayer/taxpayers/TP123456",
                "taxReturns": {
                    "href": "/income-tax/tax-returns?taxpayerId=TP123456",
                    "type": "application/json"
                },
                "payments": "/payment/payments?taxpayerId=TP123456"
            }
        })))
        .mount(&backend)
        .await;
    backend
}

async fn income_tax_backend() -> MockServer {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/income-tax/tax-returns"))
        .and(query_param("taxpayerId", "TP123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "TR2024", "taxpayerId": "TP123456", "year": 2024},
                {"id": "TR2025", "taxpayerId": "TP123456", "year": 2025}
            ]
        })))
        .mount(&backend)
        .await;
    backend
}

#[tokio::test]
async fn include_embeds_related_resources_from_another_backend() {
    let taxpayer = taxpayer_backend().await;
    let income_tax = income_tax_backend().await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &taxpayer.uri())
        .backend("income-tax", &income_tax.uri())
        .build();

    let response = gateway
        .get("/taxpayer/taxpayers/TP123456?include=taxReturns")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/vnd.restmux+json");

    let body = body_json(response).await;
    assert_eq!(
        body["_links"]["self"],
        json!("/dev/taxpayer/taxpayers/TP123456")
    );

    let returns = body["_included"]["taxReturns"].as_array().unwrap();
    assert_eq!(returns.len(), 2);
    assert_eq!(returns[0]["id"], json!("TR2024"));
    assert_eq!(returns[1]["id"], json!("TR2025"));

    // Aggregation adds _included without disturbing _links.
    let links = body["_links"].as_object().unwrap();
    assert_eq!(links.len(), 3);
}

#[tokio::test]
async fn unknown_include_name_is_not_an_error() {
    let taxpayer = taxpayer_backend().await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &taxpayer.uri())
        .build();

    let response = gateway
        .get("/taxpayer/taxpayers/TP123456?include=nonexistent")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("_included").is_none());
}

#[tokio::test]
async fn failed_include_is_omitted_while_the_rest_succeed() {
    let taxpayer = taxpayer_backend().await;
    let income_tax = income_tax_backend().await;
    // The payment backend route exists but nothing listens there.
    let gateway = TestGateway::builder()
        .backend("taxpayer", &taxpayer.uri())
        .backend("income-tax", &income_tax.uri())
        .backend("payment", "http://127.0.0.1:1")
        .build();

    let response = gateway
        .get("/taxpayer/taxpayers/TP123456?include=taxReturns,payments")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let included = body["_included"].as_object().unwrap();
    assert!(included.contains_key("taxReturns"));
    assert!(!included.contains_key("payments"));
}

#[tokio::test]
async fn include_param_whitespace_is_trimmed() {
    let taxpayer = taxpayer_backend().await;
    let income_tax = income_tax_backend().await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &taxpayer.uri())
        .backend("income-tax", &income_tax.uri())
        .build();

    let response = gateway
        .get("/taxpayer/taxpayers/TP123456?include=%20taxReturns%20,")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["_included"]["taxReturns"].is_array());
}

#[tokio::test]
async fn collection_includes_are_merged_and_deduplicated() {
    let payment = MockServer::start().await;
    // Two payments reference the same taxpayer, one references another.
    Mock::given(method("GET"))
        .and(path("/payment/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "PAY1", "_links": {"taxpayer": "/taxpayer/taxpayers/TP1"}},
                {"id": "PAY2", "_links": {"taxpayer": "/taxpayer/taxpayers/TP1"}},
                {"id": "PAY3", "_links": {"taxpayer": "/taxpayer/taxpayers/TP2"}}
            ]
        })))
        .mount(&payment)
        .await;

    let taxpayer = MockServer::start().await;
    for id in ["TP1", "TP2"] {
        Mock::given(method("GET"))
            .and(path(format!("/taxpayer/taxpayers/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .mount(&taxpayer)
            .await;
    }

    let gateway = TestGateway::builder()
        .backend("payment", &payment.uri())
        .backend("taxpayer", &taxpayer.uri())
        .build();

    let response = gateway.get("/payment/payments?include=taxpayer").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let taxpayers = body["_included"]["taxpayer"].as_array().unwrap();
    assert_eq!(taxpayers.len(), 2);
    assert_eq!(taxpayers[0]["id"], json!("TP1"));
    assert_eq!(taxpayers[1]["id"], json!("TP2"));
}

#[tokio::test]
async fn included_resources_are_fetched_in_parallel() {
    use std::time::{Duration, Instant};

    let taxpayer = taxpayer_backend().await;

    let income_tax = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/income-tax/tax-returns"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"id": "TR1"}]}))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&income_tax)
        .await;

    let payment = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payment/payments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": [{"id": "PAY1"}]}))
                .set_delay(Duration::from_millis(250)),
        )
        .mount(&payment)
        .await;

    let gateway = TestGateway::builder()
        .backend("taxpayer", &taxpayer.uri())
        .backend("income-tax", &income_tax.uri())
        .backend("payment", &payment.uri())
        .build();

    let start = Instant::now();
    let response = gateway
        .get("/taxpayer/taxpayers/TP123456?include=taxReturns,payments")
        .await;
    let elapsed = start.elapsed();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["_included"]["taxReturns"].is_array());
    assert!(body["_included"]["payments"].is_array());

    // Sequential fetches would take at least 500ms.
    assert!(
        elapsed < Duration::from_millis(450),
        "include fan-out was not concurrent: {:?}",
        elapsed
    );
}
