mod common;

use common::{test_config, FakeVerifier};
use file_service::services::init_metrics;
use file_service::startup::Application;
use reqwest::Client;
use std::sync::Arc;

async fn spawn_app() -> String {
    let app = Application::build_with_identity(test_config(), Arc::new(FakeVerifier))
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(app.run_until_stopped());

    address
}

#[tokio::test]
async fn healthz_works() {
    let address = spawn_app().await;

    let response = Client::new()
        .get(format!("{}/healthz", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn health_check_works() {
    let address = spawn_app().await;

    let response = Client::new()
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "file-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let address = spawn_app().await;

    let response = Client::new()
        .get(format!("{}/ready", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_format() {
    init_metrics().expect("Failed to install metrics recorder");
    let address = spawn_app().await;
    let client = Client::new();

    client
        .get(format!("{}/healthz", address))
        .send()
        .await
        .expect("Failed to execute request");

    let response = client
        .get(format!("{}/metrics", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type");
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.expect("Failed to get response body");
    assert!(body.contains("http_requests_total"), "Unexpected metrics: {}", body);
}
