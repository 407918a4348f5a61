//! Integration tests for the API server.

use std::sync::OnceLock;
use std::time::Duration;

use api::{Config, InMemoryBackend};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Money, ProductId};
use ledger::InventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// App over in-memory collaborators with A priced at $10.00 (5 in stock)
/// and B priced at $25.00 (none in stock).
async fn setup() -> (axum::Router, InMemoryBackend) {
    setup_with(Config::default()).await
}

async fn setup_with(config: Config) -> (axum::Router, InMemoryBackend) {
    let (state, backend) = api::create_default_state(&config);
    backend.catalog.set_price("A", Money::from_cents(1000)).await;
    backend.catalog.set_price("B", Money::from_cents(2500)).await;
    backend.ledger.adjust(&ProductId::new("A"), 5).await.unwrap();

    let app = api::create_app(state, get_metrics_handle());
    (app, backend)
}

fn post_order(user: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "memory");
}

#[tokio::test]
async fn test_create_order() {
    let (app, backend) = setup().await;

    let response = app
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 2 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["user_id"], "user-1");
    assert_eq!(json["total_cents"], 2000);
    assert_eq!(json["items"][0]["unit_price_cents"], 1000);
    assert_eq!(json["items"][0]["subtotal_cents"], 2000);
    assert!(json["id"].as_str().is_some());

    assert_eq!(backend.store.order_count().await, 1);
    assert_eq!(backend.sink.messages().await.len(), 1);
}

#[tokio::test]
async fn test_create_and_get_order() {
    let (app, _) = setup().await;

    let create_response = app
        .clone()
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        ))
        .await
        .unwrap();
    let created = body_json(create_response).await;
    let order_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(get(&format!("/orders/{order_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], order_id);
    assert_eq!(json["total_cents"], 1000);
    // The store keeps the status it was written with.
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn test_list_orders() {
    let (app, _) = setup().await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_order(
                Some("user-1"),
                serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.oneshot(get("/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let (app, backend) = setup().await;

    let response = app
        .oneshot(post_order(
            None,
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    // Only the seeding adjustment reached the ledger.
    assert_eq!(backend.ledger.adjust_calls(), 1);
}

#[tokio::test]
async fn test_empty_cart_is_bad_request() {
    let (app, _) = setup().await;

    let response = app
        .oneshot(post_order(Some("user-1"), serde_json::json!({ "items": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Cart is empty");
}

#[tokio::test]
async fn test_zero_quantity_is_bad_request() {
    let (app, _) = setup().await;

    let response = app
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 0 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (app, _) = setup().await;

    let response = app
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "NOPE", "quantity": 1 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict_and_restores_stock() {
    let (app, _) = setup().await;

    let response = app
        .clone()
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [
                { "product_id": "A", "quantity": 2 },
                { "product_id": "B", "quantity": 1 }
            ] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Insufficient stock for product B");

    let stock = body_json(app.oneshot(get("/inventory/A")).await.unwrap()).await;
    assert_eq!(stock["quantity"], 5);
}

#[tokio::test]
async fn test_persistence_failure_is_server_error() {
    let (app, backend) = setup().await;
    backend.store.set_fail_on_create(true);

    let response = app
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_deadline_exceeded_is_gateway_timeout() {
    let config = Config {
        order_deadline: Duration::from_millis(20),
        ..Config::default()
    };
    let (app, backend) = setup_with(config).await;
    backend.catalog.set_latency(Duration::from_millis(200));

    let response = app
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(backend.ledger.adjust_calls(), 1);
    assert_eq!(backend.store.create_calls(), 0);
}

#[tokio::test]
async fn test_get_order_not_found() {
    let (app, _) = setup().await;

    let fake_id = uuid::Uuid::new_v4();
    let response = app
        .oneshot(get(&format!("/orders/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_order_invalid_id() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/orders/not-a-uuid")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_stock_reads_zero() {
    let (app, _) = setup().await;

    let response = app.oneshot(get("/inventory/NEVER-STOCKED")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["product_id"], "NEVER-STOCKED");
    assert_eq!(json["quantity"], 0);
}

#[tokio::test]
async fn test_adjust_stock() {
    let (app, _) = setup().await;

    let adjust = |delta: i64| {
        Request::builder()
            .method("POST")
            .uri("/inventory/A/adjust")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "delta": delta }).to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(adjust(3)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["quantity"], 8);

    let response = app.clone().oneshot(adjust(-8)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["quantity"], 0);

    let response = app.clone().oneshot(adjust(-1)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let stock = body_json(app.oneshot(get("/inventory/A")).await.unwrap()).await;
    assert_eq!(stock["quantity"], 0);
}

#[tokio::test]
async fn test_adjust_extreme_deltas() {
    let (app, _) = setup().await;

    let adjust = |delta: i64| {
        Request::builder()
            .method("POST")
            .uri("/inventory/A/adjust")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "delta": delta }).to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(adjust(i64::MIN)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.clone().oneshot(adjust(i64::MAX)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stock = body_json(app.oneshot(get("/inventory/A")).await.unwrap()).await;
    assert_eq!(stock["quantity"], 5);
}

#[tokio::test]
async fn test_orphaned_deductions_are_listed() {
    let (app, backend) = setup().await;
    backend.store.set_fail_on_create(true);
    backend.ledger.set_fail_on_restock(true);

    let response = app
        .clone()
        .oneshot(post_order(
            Some("user-7"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 2 }] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(get("/admin/orphaned-deductions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["user_id"], "user-7");
    assert_eq!(entries[0]["kind"], "compensation_failed");
    assert_eq!(entries[0]["failure"]["product_id"], "A");
    assert_eq!(entries[0]["failure"]["quantity"], 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup().await;

    // Place an order to generate some metrics
    let _ = app
        .clone()
        .oneshot(post_order(
            Some("user-1"),
            serde_json::json!({ "items": [{ "product_id": "A", "quantity": 1 }] }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/plain"));
}
