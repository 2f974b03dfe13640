//! Vector search HTTP service.
//!
//! Turns a natural-language query into ranked product documents: the query is
//! embedded with Gemini and matched against a Firestore vector index.
//!
//! # Environment Variables
//! - `FIREBASE_SERVICE_ACCOUNT_JSON` - Service account JSON (required unless MOCK_SERVICES=true)
//! - `GEMINI_API_KEY` - Gemini API key (required unless MOCK_SERVICES=true)
//! - `HTTP_PORT` - API listen port (default: 8000)
//! - `METRICS_PORT` - Prometheus metrics port (default: 9090)
//! - `MOCK_SERVICES` - Use mock embedder and store for testing (default: false)
//! - `RUST_LOG` - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vector_search_api::config::{healthcheck_urls, load_dotenv, Config};
use vector_search_api::embedding::{Embedder, GeminiEmbedder, MockEmbedder};
use vector_search_api::http::{router, AppState};
use vector_search_api::metrics;
use vector_search_api::search::SearchService;
use vector_search_api::store::{
    DocumentStore, FirestoreStore, MockStore, ServiceAccountTokenProvider,
};

/// Run healthcheck mode: probe `GET /` and exit 0 on success.
/// Tries both IPv6 and IPv4 loopback unless HEALTHCHECK_URL is set.
async fn run_healthcheck() -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    for url in &healthcheck_urls() {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                eprintln!("healthcheck: API is healthy (via {})", url);
                std::process::exit(0);
            }
            Ok(response) => {
                eprintln!("healthcheck: {} returned {}", url, response.status());
            }
            Err(_) => continue,
        }
    }

    eprintln!("healthcheck: API not reachable");
    std::process::exit(1);
}

/// Resolve the listen address, auto-detecting dual-stack support.
async fn resolve_bind_addr(bind_address: &str, port: u16) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    if bind_address != "auto" {
        // Add brackets if it's an IPv6 address without them
        let bind_str = if bind_address.contains(':') && !bind_address.starts_with('[') {
            format!("[{}]:{}", bind_address, port)
        } else {
            format!("{}:{}", bind_address, port)
        };
        return Ok(bind_str.parse()?);
    }

    let dual_stack: SocketAddr = format!("[::]:{}", port).parse()?;
    match tokio::net::TcpListener::bind(dual_stack).await {
        Ok(_) => {
            info!("Auto-detected dual-stack support, using [::]");
            Ok(dual_stack)
        }
        Err(_) => {
            info!("IPv6 not available, falling back to IPv4 (0.0.0.0)");
            Ok(format!("0.0.0.0:{}", port).parse()?)
        }
    }
}

/// Build the embedder and store, real or mock per configuration.
fn build_clients(config: &Config) -> Result<(Arc<dyn Embedder>, Arc<dyn DocumentStore>), Box<dyn std::error::Error>> {
    if config.mock_services {
        info!("MOCK_SERVICES=true: Using mock embedder and store");
        return Ok((Arc::new(MockEmbedder::new()), Arc::new(MockStore::new())));
    }

    let api_key = config
        .gemini_api_key
        .clone()
        .ok_or("GEMINI_API_KEY not found in environment variables")?;
    let service_account = config
        .service_account
        .clone()
        .ok_or("FIREBASE_SERVICE_ACCOUNT_JSON not found in environment variables")?;

    let embedder = GeminiEmbedder::new(api_key, config.embedding_model.clone());
    let tokens = Arc::new(ServiceAccountTokenProvider::new(service_account));
    let store = FirestoreStore::new(config.project_id.clone(), config.collection.clone(), tokens);

    info!(
        project_id = %config.project_id,
        collection = %config.collection,
        model = %config.embedding_model,
        "Initialized Gemini embedder and Firestore store"
    );

    Ok((Arc::new(embedder), Arc::new(store)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (use RUST_LOG env var to control log level)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Both modes read HTTP_PORT, so .env must be in place first
    if let Err(e) = load_dotenv() {
        warn!(error = %e, "Failed to load .env file");
    }

    // Check if running in healthcheck mode
    let program_name = std::env::args()
        .next()
        .and_then(|path| {
            std::path::Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_default();

    if program_name == "healthcheck" {
        return run_healthcheck().await;
    }

    info!("Starting vector search API");

    // Missing credentials abort here, before anything listens
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_port = config.http_port,
        metrics_port = config.metrics_port,
        mock_services = config.mock_services,
        sanitize_errors = config.sanitize_errors,
        "Configuration loaded"
    );

    let metrics_handle = metrics::init_metrics()?;

    let (embedder, store) = build_clients(&config)?;
    let search = Arc::new(SearchService::new(embedder, store));
    info!(
        model = search.embedding_model(),
        collection = search.collection(),
        "Search service ready"
    );
    let state = AppState::new(search).with_sanitized_errors(config.sanitize_errors);

    // Start metrics server in background
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(metrics_port, metrics_handle).await {
            error!(error = %e, "Metrics server failed");
        }
    });

    let addr = resolve_bind_addr(&config.bind_address, config.http_port).await?;
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
