//! Request handlers for the search API.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::ServiceError;
use crate::metrics;
use crate::search::{SearchRequest, SearchResponse, SearchService};

/// Liveness message served at `GET /`.
pub const ROOT_MESSAGE: &str = "Vector Search API is running";

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    /// Replace upstream error text with a generic message in responses
    pub sanitize_errors: bool,
}

impl AppState {
    pub fn new(search: Arc<SearchService>) -> Self {
        Self {
            search,
            sanitize_errors: false,
        }
    }

    pub fn with_sanitized_errors(mut self, sanitize: bool) -> Self {
        self.sanitize_errors = sanitize;
        self
    }
}

/// Validate a search request and run it.
///
/// Empty or missing queries are rejected before either external service is
/// touched.
pub async fn handle(
    service: &SearchService,
    request: SearchRequest,
) -> Result<SearchResponse, ServiceError> {
    let query = match request.validated_query() {
        Ok(q) => q.to_string(),
        Err(e) => {
            warn!("Empty query received");
            return Err(e);
        }
    };

    let results = service.search(&query).await?;
    info!(results = results.len(), query = %query, "Returning results");

    Ok(SearchResponse { query, results })
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

/// `POST /search`
#[instrument(skip(state, payload), fields(query))]
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    metrics::increment_search_count();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected malformed search request");
            metrics::increment_search_errors("invalid_argument");
            return ServiceError::InvalidArgument("Invalid request body".to_string())
                .into_response();
        }
    };

    if let Some(query) = request.query.as_deref() {
        tracing::Span::current().record("query", query);
    }
    info!("Received search request");

    match handle(&state.search, request).await {
        Ok(response) => {
            metrics::record_search_latency(start.elapsed().as_secs_f64() * 1000.0);
            Json(response).into_response()
        }
        Err(e) => {
            metrics::increment_search_errors(e.kind());
            e.into_response_with(state.sanitize_errors)
        }
    }
}
