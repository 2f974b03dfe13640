//! Error types for the vector search service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Fixed message returned when the request carries no usable query.
pub const QUERY_REQUIRED: &str = "Query parameter is required";

/// Generic detail used in place of upstream error text when sanitizing.
pub const UPSTREAM_FAILED: &str = "Search failed";

/// Request-level errors that can occur while serving a search.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailure(String),

    #[error("Search failed: {0}")]
    SearchFailure(String),
}

impl ServiceError {
    /// Shorthand for the empty/missing query rejection.
    pub fn query_required() -> Self {
        ServiceError::InvalidArgument(QUERY_REQUIRED.to_string())
    }

    /// HTTP status this error maps to at the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::EmbeddingFailure(_) | ServiceError::SearchFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Label used for the `kind` dimension of the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::EmbeddingFailure(_) => "embedding",
            ServiceError::SearchFailure(_) => "search",
        }
    }

    /// True for failures of the embedding service or the document store.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, ServiceError::InvalidArgument(_))
    }

    /// Detail string exposed to callers.
    ///
    /// With `sanitize` set, upstream failures collapse to a generic message;
    /// validation errors are always fixed text and pass through unchanged.
    pub fn detail(&self, sanitize: bool) -> String {
        if sanitize && self.is_upstream() {
            UPSTREAM_FAILED.to_string()
        } else {
            self.to_string()
        }
    }

    /// Build the `{"detail": ...}` response for this error.
    pub fn into_response_with(self, sanitize: bool) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.detail(sanitize) }))).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
