//! End-to-end tests driving the assembled router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use storebot_core::{fixtures, Catalog, FixedWindowLimiter, InMemoryAuditSink, Ledger};
use storebot_server::audit_layer::AuditHandle;
use storebot_server::{router, AppState};
use tower::ServiceExt;

fn test_app() -> (Router, InMemoryAuditSink) {
    let sink = InMemoryAuditSink::default();
    let state = AppState::new(
        Catalog::new(fixtures::demo_products()),
        Ledger::new(fixtures::demo_orders()),
        FixedWindowLimiter::new(900, 10),
        AuditHandle::new(Arc::new(sink.clone())),
    );
    (router(state), sink)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    split(response).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    split(response).await
}

async fn split(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_is_always_ok() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn search_finds_products_by_title_case_insensitively() {
    let (app, _) = test_app();

    for uri in ["/search?q=hoodie", "/search?q=HOODIE"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().expect("array body");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Charcoal Hoodie");
    }
}

#[tokio::test]
async fn search_finds_products_by_tag() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/search?q=grooming").await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().expect("array body");
    assert!(!results.is_empty());
    for product in results {
        let tags = product["tags"].as_array().expect("tags");
        assert!(tags.iter().any(|tag| tag == "grooming"));
    }
}

#[tokio::test]
async fn search_without_query_is_a_bad_request() {
    let (app, _) = test_app();

    let (status, body) = get(&app, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query \"q\" is required.");

    // Other parameters do not rescue a missing q.
    let (status, _) = get(&app, "/search?minPrice=1&maxPrice=99").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_price_bounds_are_inclusive() {
    let (app, _) = test_app();

    let (status, body) = get(&app, "/search?q=hoodie&minPrice=45&maxPrice=45").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);

    let (status, body) = get(&app, "/search?q=hoodie&minPrice=46").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn search_with_no_matches_is_an_empty_list_not_an_error() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/search?q=zeppelin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn cart_add_accumulates_quantities_across_calls() {
    let (app, _) = test_app();

    let (status, body) = post_json(&app, "/cart/add", json!({"productId": "p1", "qty": 2})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 2);

    let (status, body) = post_json(&app, "/cart/add", json!({"productId": "p1", "qty": 3})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 5);
    assert_eq!(body["cart"]["p1"]["qty"], 5);
}

#[tokio::test]
async fn cart_add_unknown_product_is_404_and_leaves_the_cart_alone() {
    let (app, _) = test_app();

    let (status, body) = post_json(&app, "/cart/add", json!({"productId": "p99", "qty": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found.");

    let (_, body) = post_json(&app, "/cart/add", json!({"productId": "p2", "qty": 1})).await;
    assert_eq!(body["totalItems"], 1);
    assert!(body["cart"].get("p99").is_none());
}

#[tokio::test]
async fn cart_add_validation_reports_field_errors() {
    let (app, _) = test_app();
    let (status, body) = post_json(&app, "/cart/add", json!({"productId": "", "qty": 0})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["productId"][0], "Product ID is required.");
    assert_eq!(body["error"]["qty"][0], "Quantity must be at least 1.");
}

#[tokio::test]
async fn order_status_returns_the_order_with_enriched_items() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-1001", "email": "alice@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Shipped");
    assert_eq!(body["items"][0]["title"], "Charcoal Hoodie");
}

#[tokio::test]
async fn order_status_email_match_ignores_case() {
    let (app, _) = test_app();
    let (status, _) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-1001", "email": "ALICE@EXAMPLE.COM"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn order_status_wrong_email_is_unauthorized() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-1001", "email": "wrong@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let message = body["error"].as_str().expect("string error");
    assert!(message.contains("Unauthorized"));
}

#[tokio::test]
async fn order_status_unknown_order_is_404() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-9999", "email": "alice@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found.");
}

#[tokio::test]
async fn order_status_malformed_input_fails_validation_before_lookup() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "1001", "email": "not-an-email"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["orderId"][0], "Invalid Order ID format.");
    assert_eq!(body["error"]["email"][0], "Invalid email address.");
}

#[tokio::test]
async fn order_status_falls_back_to_unknown_product_for_retired_items() {
    let (app, _) = test_app();
    let (status, body) = post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-1003", "email": "carol@example.com"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["title"].as_str().expect("title"))
        .collect();
    assert!(titles.contains(&"Canvas Tote"));
    assert!(titles.contains(&"Unknown Product"));
}

#[tokio::test]
async fn order_status_is_rate_limited_after_ten_calls_per_client() {
    let (app, _) = test_app();
    let payload = json!({"orderId": "ORD-1001", "email": "alice@example.com"});

    for call in 1..=10 {
        let (status, _) = post_json(&app, "/order/status", payload.clone()).await;
        assert_eq!(status, StatusCode::OK, "call {call} should pass");
    }

    let request = Request::builder()
        .method("POST")
        .uri("/order/status")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get("RateLimit-Remaining").and_then(|v| v.to_str().ok()),
        Some("0")
    );
    assert!(response.headers().contains_key("Retry-After"));
    let (_, body) = split(response).await;
    assert_eq!(
        body["error"],
        "Too many requests to this endpoint, please try again after 15 minutes."
    );

    // Still inside the same window: rejected again.
    let (status, _) = post_json(&app, "/order/status", payload).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn metrics_reflect_request_counts_including_failures() {
    let (app, _) = test_app();

    get(&app, "/search?q=hoodie").await;
    get(&app, "/search").await; // 400 still counts
    post_json(&app, "/cart/add", json!({"productId": "p1", "qty": 1})).await;

    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"searches": 2, "addsToCart": 1, "orderLookups": 0}));
}

#[tokio::test]
async fn audit_records_mask_emails_on_the_order_status_path() {
    let (app, sink) = test_app();
    post_json(
        &app,
        "/order/status",
        json!({"orderId": "ORD-1001", "email": "alice@example.com"}),
    )
    .await;

    let records = sink.records();
    let record = records
        .iter()
        .find(|record| record.intent == "POST /order/status")
        .expect("order status should be audited");
    assert_eq!(record.payload["email"], "a*****@example.com");
    assert_eq!(record.result_summary.status_code, 200);

    let raw = serde_json::to_string(record).expect("record serializes");
    assert!(!raw.contains("alice@example.com"));
}

#[tokio::test]
async fn audit_records_capture_get_query_parameters() {
    let (app, sink) = test_app();
    get(&app, "/search?q=hoodie&minPrice=10").await;

    let records = sink.records();
    let record = records
        .iter()
        .find(|record| record.intent == "GET /search")
        .expect("search should be audited");
    assert_eq!(record.payload["q"], "hoodie");
    assert_eq!(record.payload["minPrice"], "10");
    assert_eq!(record.result_summary.status_code, 200);
}

#[tokio::test]
async fn audit_records_cover_rate_limited_responses() {
    let (app, sink) = test_app();
    let payload = json!({"orderId": "ORD-1001", "email": "alice@example.com"});

    for _ in 0..11 {
        post_json(&app, "/order/status", payload.clone()).await;
    }

    let records = sink.records();
    assert!(records
        .iter()
        .any(|record| record.result_summary.status_code == 429
            && record.intent == "POST /order/status"));
}
