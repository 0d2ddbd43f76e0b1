use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::skills::fetcher::FetchError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Validation(String),

    /// The file host answered with something other than 200; its status is echoed back.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    FetchTimeout(String),

    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::Status { status, .. } => AppError::Upstream { status, message },
            FetchError::Timeout { .. } => AppError::FetchTimeout(message),
            FetchError::Http(e) => AppError::Internal(e.into()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Extraction(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::UnsupportedMediaType(msg) | AppError::Validation(msg) => {
                tracing::warn!("Rejected request: {msg}");
            }
            AppError::Upstream { status, message } => {
                tracing::warn!("Upstream returned {status}: {message}");
            }
            AppError::FetchTimeout(msg) => tracing::error!("Fetch timeout: {msg}"),
            AppError::Extraction(msg) => tracing::error!("PDF extraction error: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
