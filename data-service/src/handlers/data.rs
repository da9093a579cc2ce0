//! The document endpoint: read the stored file, or replace it with new rows.

use crate::models::{decode_content, Document};
use crate::services::FileUpdate;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;

pub const COMMIT_MESSAGE: &str = "Auto-save data.json";
pub const ALLOWED_METHODS: &str = "GET, POST";
const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Returns the stored file text as-is.
#[tracing::instrument(skip_all)]
pub async fn read_document(State(state): State<AppState>) -> Result<Response, AppError> {
    let file = state.store.fetch().await?;
    let text = decode_content(&file.content)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, JSON_UTF8)],
        text,
    )
        .into_response())
}

/// Replaces the stored document with `{ rows }` from the body.
///
/// The body is parsed whatever its content type. The current file is read
/// back first and the update is conditioned on the sha seen at that moment;
/// a stale sha comes back from the store as an ordinary upstream error.
#[tracing::instrument(skip_all, fields(body_len = body.len()))]
pub async fn write_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let document = Document::from_request_body(&body)?;

    let _guard = match &state.write_lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    let current = state.store.fetch().await?;
    let update = FileUpdate {
        message: COMMIT_MESSAGE.to_string(),
        content: document.to_base64()?,
        sha: current.sha,
    };
    state.store.update(&update).await?;

    tracing::info!(rows = document.rows.len(), "Document saved");
    Ok(Json(json!({ "ok": true })))
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        "Method Not Allowed",
    )
}
