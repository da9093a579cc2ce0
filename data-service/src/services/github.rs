//! GitHub contents API client.
//!
//! Reads and replaces a single file on a branch. Every request carries the
//! bearer token and pins the REST API version.

use super::content_store::{ContentStore, FileUpdate, RemoteFile};
use crate::config::GithubSettings;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::error::AppError;
use std::time::Instant;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("data-service/", env!("CARGO_PKG_VERSION"));

pub struct GithubContentStore {
    client: Client,
    settings: GithubSettings,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// Owner, repo and token, checked present.
struct Target<'a> {
    owner: &'a str,
    repo: &'a str,
    token: &'a str,
}

impl GithubContentStore {
    pub fn new(settings: GithubSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

        Ok(Self { client, settings })
    }

    fn target(&self) -> Result<Target<'_>, AppError> {
        let missing = |name: &str| {
            AppError::ConfigError(anyhow::anyhow!("{} is required but not set", name))
        };

        Ok(Target {
            owner: self.settings.owner.as_deref().ok_or_else(|| missing("GH_OWNER"))?,
            repo: self.settings.repo.as_deref().ok_or_else(|| missing("GH_REPO"))?,
            token: self
                .settings
                .token
                .as_ref()
                .map(|t| t.expose_secret().as_str())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| missing("GH_TOKEN"))?,
        })
    }

    /// `{api_base}/repos/{owner}/{repo}/contents/{path}` with the path encoded
    /// as a single URI component.
    fn contents_url(&self, target: &Target<'_>) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_base.trim_end_matches('/'),
            target.owner,
            target.repo,
            urlencoding::encode(&self.settings.path)
        )
    }

    fn authorized(&self, request: RequestBuilder, target: &Target<'_>) -> RequestBuilder {
        request
            .bearer_auth(target.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(API_VERSION_HEADER, API_VERSION)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, AppError> {
        let started = Instant::now();
        let result = request.send().await;
        histogram!("content_store_request_duration_seconds", "operation" => operation)
            .record(started.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                counter!("content_store_requests_total", "operation" => operation, "outcome" => "transport_error")
                    .increment(1);
                tracing::error!(operation, error = %e, "Content store request failed");
                return Err(AppError::Upstream(format!(
                    "Request to content store failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            counter!("content_store_requests_total", "operation" => operation, "outcome" => "rejected")
                .increment(1);
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                operation,
                status = status.as_u16(),
                path = %self.settings.path,
                "Content store returned error status"
            );
            let message = if body.is_empty() {
                format!("Content store returned {}", status)
            } else {
                body
            };
            return Err(AppError::Upstream(message));
        }

        counter!("content_store_requests_total", "operation" => operation, "outcome" => "ok")
            .increment(1);
        Ok(response)
    }
}

#[async_trait]
impl ContentStore for GithubContentStore {
    async fn fetch(&self) -> Result<RemoteFile, AppError> {
        let target = self.target()?;
        let url = format!(
            "{}?ref={}",
            self.contents_url(&target),
            urlencoding::encode(&self.settings.branch)
        );

        let request = self.authorized(self.client.get(&url), &target);
        let response = self.send("fetch", request).await?;

        let file: RemoteFile = response.json().await.map_err(|e| {
            AppError::Upstream(format!("Unexpected content store response: {}", e))
        })?;

        tracing::debug!(path = %self.settings.path, sha = %file.sha, "Fetched document");
        Ok(file)
    }

    async fn update(&self, update: &FileUpdate) -> Result<(), AppError> {
        let target = self.target()?;
        let body = PutContentsRequest {
            message: &update.message,
            content: &update.content,
            sha: &update.sha,
            branch: &self.settings.branch,
        };

        let request = self.authorized(self.client.put(self.contents_url(&target)), &target);
        self.send("update", request.json(&body)).await?;

        tracing::info!(
            path = %self.settings.path,
            branch = %self.settings.branch,
            base_sha = %update.sha,
            "Committed document update"
        );
        Ok(())
    }
}
