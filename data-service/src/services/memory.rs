use super::content_store::{ContentStore, FileUpdate, RemoteFile};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use service_core::error::AppError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// In-process content store with the same version-token semantics as the
/// remote one: every update must name the current sha and bumps it.
pub struct InMemoryContentStore {
    state: Mutex<StoredFile>,
    fetch_count: AtomicU64,
    update_count: AtomicU64,
}

struct StoredFile {
    content: String,
    version: u64,
    fetch_failure: Option<String>,
}

impl StoredFile {
    fn sha(&self) -> String {
        format!("{:040x}", self.version)
    }
}

impl InMemoryContentStore {
    pub fn new(initial_text: &str) -> Self {
        Self {
            state: Mutex::new(StoredFile {
                content: STANDARD.encode(initial_text),
                version: 1,
                fetch_failure: None,
            }),
            fetch_count: AtomicU64::new(0),
            update_count: AtomicU64::new(0),
        }
    }

    /// Make subsequent fetches fail with `message`, or succeed again with `None`.
    pub async fn set_fetch_failure(&self, message: Option<&str>) {
        self.state.lock().await.fetch_failure = message.map(str::to_string);
    }

    /// Decoded text of the stored file.
    pub async fn current_text(&self) -> String {
        let state = self.state.lock().await;
        STANDARD
            .decode(&state.content)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    pub async fn current_sha(&self) -> String {
        self.state.lock().await.sha()
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Accepted and rejected updates alike.
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn fetch(&self) -> Result<RemoteFile, AppError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;

        if let Some(message) = &state.fetch_failure {
            return Err(AppError::Upstream(message.clone()));
        }

        Ok(RemoteFile {
            content: state.content.clone(),
            sha: state.sha(),
        })
    }

    async fn update(&self, update: &FileUpdate) -> Result<(), AppError> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;

        if update.sha != state.sha() {
            return Err(AppError::Upstream(format!(
                r#"{{"message":"data.json does not match {}","status":"409"}}"#,
                update.sha
            )));
        }

        state.content = update.content.clone();
        state.version += 1;
        Ok(())
    }
}
