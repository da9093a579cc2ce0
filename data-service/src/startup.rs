use crate::config::DataConfig;
use crate::handlers;
use crate::services::{ContentStore, GithubContentStore};
use axum::{body::Body, middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{make_request_span, metrics_middleware, request_id_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub const DATA_ROUTE: &str = "/api/data";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    /// Present when writes are serialized within this process.
    pub write_lock: Option<Arc<Mutex<()>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, serialize_writes: bool) -> Self {
        Self {
            store,
            write_lock: serialize_writes.then(|| Arc::new(Mutex::new(()))),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            DATA_ROUTE,
            get(handlers::read_document)
                .post(handlers::write_document)
                // `get` would otherwise answer HEAD too
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route_layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: DataConfig) -> Result<Self, AppError> {
        let store = GithubContentStore::new(config.github.clone())?;
        let state = AppState::new(Arc::new(store), config.serialize_writes);

        tracing::info!(
            path = %config.github.path,
            branch = %config.github.branch,
            serialize_writes = config.serialize_writes,
            "Document proxy configured"
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
