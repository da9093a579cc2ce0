use data_service::config::DataConfig;
use data_service::services::init_metrics;
use data_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = DataConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "data-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Must be installed before any metric is recorded
    init_metrics().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    app.run_until_stopped().await
}
