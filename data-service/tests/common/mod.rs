#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use data_service::config::{DataConfig, GithubSettings};
use data_service::services::InMemoryContentStore;
use data_service::startup::{build_router, AppState, Application, DATA_ROUTE};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_OWNER: &str = "octo";
pub const TEST_REPO: &str = "notes";
pub const TEST_TOKEN: &str = "ghp_test_token";
pub const CONTENTS_PATH: &str = "/repos/octo/notes/contents/data.json";

pub fn github_settings(api_base: &str) -> GithubSettings {
    GithubSettings {
        owner: Some(TEST_OWNER.to_string()),
        repo: Some(TEST_REPO.to_string()),
        path: "data.json".to_string(),
        branch: "main".to_string(),
        token: Some(Secret::new(TEST_TOKEN.to_string())),
        api_base: api_base.to_string(),
    }
}

/// Router over an in-memory store, for `oneshot` requests.
pub fn memory_app(initial_text: &str) -> (Router, Arc<InMemoryContentStore>) {
    let store = Arc::new(InMemoryContentStore::new(initial_text));
    let app = build_router(AppState::new(store.clone(), false));
    (app, store)
}

pub async fn send(app: &Router, method: &str, body: Option<&str>) -> Response {
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(DATA_ROUTE)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .expect("router should respond")
}

pub async fn read_body(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, String::from_utf8(bytes.to_vec()).expect("body should be UTF-8"))
}

pub async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let (status, text) = read_body(response).await;
    let json = serde_json::from_str(&text).expect("Failed to parse JSON");
    (status, json)
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Runs the real application on a random port against `github`.
    pub async fn spawn(github: GithubSettings) -> Self {
        let config = DataConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            github,
            serialize_writes: false,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }

    pub fn data_url(&self) -> String {
        format!("{}{}", self.address, DATA_ROUTE)
    }
}
