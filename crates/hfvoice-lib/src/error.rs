//! Upstream and API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hfvoice_core::types::ErrorBody;

/// Failure talking to the inference provider.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Error surfaced to HTTP callers as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }

    /// Wrap an upstream failure with a per-endpoint prefix, e.g. `"LLM error"`.
    pub fn upstream(prefix: &str, err: UpstreamError) -> Self {
        tracing::warn!("{prefix}: {err}");
        Self::internal(format!("{prefix}: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}
