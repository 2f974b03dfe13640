//! Prometheus metrics for the vector search service.
//!
//! Exposes an HTTP endpoint for Prometheus scraping.

use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Initialize the metrics system and return the Prometheus handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    describe_histogram!(
        "vector_search_latency_ms",
        "End-to-end time for a search request in milliseconds"
    );
    describe_histogram!(
        "embedding_latency_ms",
        "Time taken by the embedding service in milliseconds"
    );
    describe_histogram!(
        "firestore_query_latency_ms",
        "Time taken by the nearest-neighbor query in milliseconds"
    );
    describe_counter!(
        "vector_search_requests_total",
        "Total number of search requests processed"
    );
    describe_counter!(
        "vector_search_errors_total",
        "Total number of failed search requests, by kind"
    );

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    Ok(handle)
}

/// Record an end-to-end search latency measurement.
pub fn record_search_latency(latency_ms: f64) {
    histogram!("vector_search_latency_ms").record(latency_ms);
}

/// Record an embedding call latency measurement.
pub fn record_embedding_latency(latency_ms: f64) {
    histogram!("embedding_latency_ms").record(latency_ms);
}

/// Record a store query latency measurement.
pub fn record_store_latency(latency_ms: f64) {
    histogram!("firestore_query_latency_ms").record(latency_ms);
}

/// Increment the search count.
pub fn increment_search_count() {
    counter!("vector_search_requests_total").increment(1);
}

/// Increment the search error count for `kind`.
pub fn increment_search_errors(kind: &'static str) {
    counter!("vector_search_errors_total", "kind" => kind).increment(1);
}

/// Create an Axum router for the metrics HTTP endpoint.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

/// Start the metrics HTTP server on the given port with auto-detect binding.
pub async fn start_metrics_server(port: u16, handle: PrometheusHandle) -> std::io::Result<()> {
    let app = metrics_router(handle);

    // Try dual-stack first, fall back to IPv4-only
    if let Ok(listener) = tokio::net::TcpListener::bind(("::", port)).await {
        info!(port = port, bind = "::", "Starting metrics server (dual-stack)");
        return axum::serve(listener, app).await;
    }

    info!(port = port, bind = "0.0.0.0", "Starting metrics server (IPv4-only fallback)");
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app).await
}
