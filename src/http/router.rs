//! Axum router wiring for the search API.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{root, search, AppState};

/// Build the API router.
///
/// CORS allows any origin, method and header. Tighten before exposing the
/// service beyond development.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/search", post(search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
