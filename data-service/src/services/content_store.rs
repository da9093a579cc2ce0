use async_trait::async_trait;
use serde::Deserialize;
use service_core::error::AppError;

/// Current state of the managed file as reported by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    /// Base64 file content, possibly line-wrapped.
    pub content: String,
    /// Version token. Must be echoed back unchanged on the next update.
    pub sha: String,
}

/// A replacement of the managed file, conditioned on `sha`.
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub message: String,
    /// Base64 of the new file content.
    pub content: String,
    pub sha: String,
}

/// Persistence seam for the managed document. Implementations hold the file
/// reference; callers only see the file and its version token.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self) -> Result<RemoteFile, AppError>;
    async fn update(&self, update: &FileUpdate) -> Result<(), AppError>;
}
