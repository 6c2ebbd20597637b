mod common;

use common::{approved_event, delivery_settings, fixture_event};
use serde_json::{Value, json};
use std::time::Duration;
use webhook_relay::application::relay::{RelayPolicy, RelayRoute};
use webhook_relay::domain::delivery::DeliveryErrorKind;
use webhook_relay::domain::ports::DeliveryPort;
use webhook_relay::infrastructure::http_delivery::HttpDeliveryAdapter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Nothing listens on port 1
const UNREACHABLE: &str = "http://127.0.0.1:1/webhooks";

async fn destination(status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhooks"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn url(server: &MockServer) -> String {
    format!("{}/webhooks", server.uri())
}

#[tokio::test]
async fn test_success_uses_destination_message() {
    let server = destination(
        200,
        json!({"success": true, "message": "reserva confirmada", "error_code": null, "data": null}),
    )
    .await;
    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(url(&server), UNREACHABLE.to_string())).unwrap();

    let outcome = adapter
        .deliver_to_primary(&approved_event("txn_1"))
        .await
        .unwrap();

    assert!(outcome.succeeded);
    assert_eq!(outcome.message, "reserva confirmada");
    assert_eq!(outcome.error_code(), None);
}

#[tokio::test]
async fn test_posts_full_event_payload() {
    let server = destination(200, json!({"success": true, "message": "ok"})).await;
    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(url(&server), UNREACHABLE.to_string())).unwrap();
    let event = fixture_event("payout_updated");

    adapter.deliver_to_primary(&event).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = requests[0].body_json().unwrap();

    assert_eq!(body["event"], "payout.updated");
    assert_eq!(body["timestamp"], 1_718_301_962);
    assert_eq!(body["environment"], "test");
    let tx = &body["data"]["transaction"];
    assert_eq!(tx["id"], "11991-1718301950-13582");
    assert_eq!(tx["payout_id"], "po_01HZX8Q2K6");
    assert_eq!(tx["created_at"], "2024-06-13T18:05:50.000Z");
    assert_eq!(tx["payee"]["account_type"], "SAVINGS");
    assert_eq!(tx["failure_reason"]["code"], "C01");
    assert!(tx["shipping_address"].is_null());
    assert_eq!(body["signature"]["properties"][1], "transaction.status");
}

#[tokio::test]
async fn test_client_error_classification() {
    let server = destination(400, json!({"success": false, "message": "missing reference"})).await;
    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(url(&server), UNREACHABLE.to_string())).unwrap();

    let outcome = adapter
        .deliver_to_primary(&approved_event("txn_2"))
        .await
        .unwrap();

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Client(400)));
    assert_eq!(outcome.error_code().as_deref(), Some("HTTP_CLIENT_ERROR_400"));
    assert!(outcome.message.contains("missing reference"));
}

#[tokio::test]
async fn test_server_error_classification() {
    let server = destination(503, json!({"success": false, "message": "maintenance"})).await;
    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(UNREACHABLE.to_string(), url(&server))).unwrap();

    let outcome = adapter
        .deliver_to_secondary(&approved_event("txn_3"))
        .await
        .unwrap();

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_code().as_deref(), Some("HTTP_SERVER_ERROR_503"));
}

#[tokio::test]
async fn test_connection_refused_classification() {
    let adapter = HttpDeliveryAdapter::new(&delivery_settings(
        UNREACHABLE.to_string(),
        UNREACHABLE.to_string(),
    ))
    .unwrap();

    let outcome = adapter
        .deliver_to_primary(&approved_event("txn_4"))
        .await
        .unwrap();

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Connection));
    assert!(outcome.message.starts_with("connection error"));
}

#[tokio::test]
async fn test_slow_destination_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(url(&server), UNREACHABLE.to_string())).unwrap();

    let outcome = adapter
        .deliver_to_primary(&approved_event("txn_5"))
        .await
        .unwrap();

    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_code().as_deref(), Some("CONNECTION_ERROR"));
}

#[tokio::test]
async fn test_relay_over_http_falls_back_once() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "ok"})))
        .expect(1)
        .mount(&secondary)
        .await;

    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(primary.uri(), secondary.uri())).unwrap();
    let policy = RelayPolicy::new(Box::new(adapter));

    let result = policy.relay(&fixture_event("transaction_updated")).await;

    assert!(result.succeeded);
    assert_eq!(result.route, RelayRoute::Fallback);
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhooks"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/moved"))
        .expect(1)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary)
        .await;

    let secondary = destination(200, json!({"success": true, "message": "ok"})).await;

    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(url(&primary), url(&secondary))).unwrap();

    let outcome = adapter
        .deliver_to_primary(&approved_event("txn_7"))
        .await
        .unwrap();
    assert!(!outcome.succeeded);
    assert_eq!(outcome.error_code().as_deref(), Some("UNEXPECTED_ERROR"));

    let result = RelayPolicy::new(Box::new(adapter))
        .relay(&approved_event("txn_7"))
        .await;
    assert!(result.succeeded);
    assert_eq!(result.route, RelayRoute::Fallback);
    assert_eq!(secondary.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_relay_over_http_primary_success_skips_secondary() {
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&secondary)
        .await;

    let adapter =
        HttpDeliveryAdapter::new(&delivery_settings(primary.uri(), secondary.uri())).unwrap();
    let policy = RelayPolicy::new(Box::new(adapter));

    let result = policy.relay(&approved_event("txn_6")).await;

    assert!(result.succeeded);
    assert_eq!(result.route, RelayRoute::Primary);
}
