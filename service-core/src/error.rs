use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// Non-success or unusable answer from the remote content store. Carries the
    /// upstream's own error text; not-found, conflict and rate limiting are not
    /// told apart.
    #[error("{0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("{0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = self.status();
        let error = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %error, "Request rejected");
        }

        (status, Json(ErrorResponse { error })).into_response()
    }
}
