//! HTTP error mapping.

use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use schulaufgabe_core::PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    BadRequest(String),

    /// Multipart decoding failed; carries the status axum assigned (413 for an
    /// oversized body).
    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Incorrect username or password")]
    Unauthorized,

    #[error("Server configuration error: Metrics authentication not properly configured")]
    MetricsNotConfigured,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(err) => match err {
                PipelineError::InvalidSessionId(_) => StatusCode::BAD_REQUEST,
                PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
                PipelineError::Config(_)
                | PipelineError::Upstream(_)
                | PipelineError::CompilationFailed { .. }
                | PipelineError::ArtifactMissing { .. }
                | PipelineError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart { status, .. } => *status,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MetricsNotConfigured | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Response body. Not-found errors use the short "<artifact> not found" form.
    fn body(&self) -> String {
        match self {
            ApiError::Pipeline(PipelineError::NotFound { artifact, .. }) => {
                format!("{} not found", artifact.label())
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[HTTP] {}: {}", status, self);
        }

        let body = self.body();
        match self {
            ApiError::Unauthorized => {
                (status, [(WWW_AUTHENTICATE, "Basic")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
