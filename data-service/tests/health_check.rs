mod common;

use common::{github_settings, TestApp};
use reqwest::Client;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn(github_settings("http://127.0.0.1:9")).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "data-service");
}

#[tokio::test]
async fn metrics_endpoint_returns_text() {
    let app = TestApp::spawn(github_settings("http://127.0.0.1:9")).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .expect("Invalid content-type")
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn unreachable_upstream_yields_500() {
    let app = TestApp::spawn(github_settings("http://127.0.0.1:9")).await;

    let response = Client::new()
        .get(app.data_url())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Request to content store failed"));
}
