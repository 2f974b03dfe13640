//! Configuration module for the vector search service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;

use crate::store::ServiceAccountKey;

/// Default Firestore collection holding the product documents.
pub const DEFAULT_COLLECTION: &str = "combined_products";

/// Default Gemini embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/text-embedding-004";

/// Service configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Parsed Firestore service account (absent only in mock mode)
    pub service_account: Option<ServiceAccountKey>,
    /// Firestore project id (service account's project unless overridden)
    pub project_id: String,
    /// Gemini API key (absent only in mock mode)
    pub gemini_api_key: Option<String>,
    /// Collection searched by the nearest-neighbor query
    pub collection: String,
    /// Embedding model resource name
    pub embedding_model: String,
    /// HTTP API port
    pub http_port: u16,
    /// Prometheus metrics HTTP port
    pub metrics_port: u16,
    /// Bind address (supports IPv4, IPv6, or dual-stack)
    pub bind_address: String,
    /// Use in-process mock clients instead of Gemini/Firestore
    pub mock_services: bool,
    /// Hide upstream error text from API responses
    pub sanitize_errors: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "service_account",
                &self.service_account.as_ref().map(|sa| &sa.client_email),
            )
            .field("project_id", &self.project_id)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("collection", &self.collection)
            .field("embedding_model", &self.embedding_model)
            .field("http_port", &self.http_port)
            .field("metrics_port", &self.metrics_port)
            .field("bind_address", &self.bind_address)
            .field("mock_services", &self.mock_services)
            .field("sanitize_errors", &self.sanitize_errors)
            .finish()
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `FIREBASE_SERVICE_ACCOUNT_JSON` - Service account JSON blob (required unless MOCK_SERVICES=true)
    /// - `GEMINI_API_KEY` - Gemini API key (required unless MOCK_SERVICES=true)
    /// - `FIRESTORE_PROJECT_ID` - Override for the service account's project
    /// - `COLLECTION_NAME` - Firestore collection (default: combined_products)
    /// - `EMBEDDING_MODEL` - Embedding model (default: models/text-embedding-004)
    /// - `HTTP_PORT` - API listen port (default: 8000)
    /// - `METRICS_PORT` - Prometheus metrics port (default: 9090)
    /// - `BIND_ADDRESS` - Bind address (default: auto-detect [::] or 0.0.0.0)
    /// - `MOCK_SERVICES` - Use mock embedder and store (default: false)
    /// - `SANITIZE_ERRORS` - Hide upstream error detail from clients (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mock_services = env_flag("MOCK_SERVICES");

        let service_account = match non_empty_var("FIREBASE_SERVICE_ACCOUNT_JSON") {
            Some(raw) => Some(
                ServiceAccountKey::from_json(&raw)
                    .map_err(|e| ConfigError::InvalidServiceAccount(format!("{:#}", e)))?,
            ),
            None if mock_services => None,
            None => return Err(ConfigError::MissingRequired("FIREBASE_SERVICE_ACCOUNT_JSON")),
        };

        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        if !mock_services && gemini_api_key.is_none() {
            return Err(ConfigError::MissingRequired("GEMINI_API_KEY"));
        }

        let project_id = non_empty_var("FIRESTORE_PROJECT_ID")
            .or_else(|| service_account.as_ref().map(|sa| sa.project_id.clone()))
            .unwrap_or_default();
        if !mock_services && project_id.is_empty() {
            return Err(ConfigError::InvalidServiceAccount(
                "project_id is empty".to_string(),
            ));
        }

        let collection =
            non_empty_var("COLLECTION_NAME").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let embedding_model = non_empty_var("EMBEDDING_MODEL")
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let http_port = env::var("HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9090);

        // "auto" tries dual-stack (::) first and falls back to 0.0.0.0
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "auto".to_string());

        Ok(Config {
            service_account,
            project_id,
            gemini_api_key,
            collection,
            embedding_model,
            http_port,
            metrics_port,
            bind_address,
            mock_services,
            sanitize_errors: env_flag("SANITIZE_ERRORS"),
        })
    }
}

/// Load `.env` into the process environment. A missing file is not an error.
///
/// Variables already present in the environment win over the file.
pub fn load_dotenv() -> Result<(), dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// URLs probed by healthcheck mode.
///
/// `HEALTHCHECK_URL` if set, otherwise `GET /` on both loopback addresses at
/// `HTTP_PORT` (default 8000).
pub fn healthcheck_urls() -> Vec<String> {
    match env::var("HEALTHCHECK_URL") {
        Ok(url) => vec![url],
        Err(_) => {
            let port = env::var("HTTP_PORT").unwrap_or_else(|_| "8000".to_string());
            vec![
                format!("http://[::1]:{}/", port),
                format!("http://127.0.0.1:{}/", port),
            ]
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    MissingRequired(&'static str),

    #[error("Invalid service account: {0}")]
    InvalidServiceAccount(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "FIREBASE_SERVICE_ACCOUNT_JSON",
            "GEMINI_API_KEY",
            "FIRESTORE_PROJECT_ID",
            "COLLECTION_NAME",
            "EMBEDDING_MODEL",
            "HTTP_PORT",
            "METRICS_PORT",
            "MOCK_SERVICES",
            "SANITIZE_ERRORS",
            "HEALTHCHECK_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults_with_mock_services() {
        clear_env();
        env::set_var("MOCK_SERVICES", "true");

        let config = Config::from_env().unwrap();
        assert!(config.mock_services);
        assert!(config.service_account.is_none());
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.collection, "combined_products");
        assert_eq!(config.embedding_model, "models/text-embedding-004");
        assert!(!config.sanitize_errors);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_service_account_is_fatal() {
        clear_env();
        env::set_var("GEMINI_API_KEY", "key");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequired("FIREBASE_SERVICE_ACCOUNT_JSON")
        ));
        assert_eq!(
            err.to_string(),
            "FIREBASE_SERVICE_ACCOUNT_JSON not found in environment variables"
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_service_account_is_fatal() {
        clear_env();
        env::set_var("FIREBASE_SERVICE_ACCOUNT_JSON", "{not json");
        env::set_var("GEMINI_API_KEY", "key");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServiceAccount(_)));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_redacts_api_key() {
        clear_env();
        env::set_var("MOCK_SERVICES", "1");
        env::set_var("GEMINI_API_KEY", "super-secret-key");

        let config = Config::from_env().unwrap();
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains("super-secret-key"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_healthcheck_urls_default_port() {
        clear_env();

        assert_eq!(
            healthcheck_urls(),
            vec!["http://[::1]:8000/", "http://127.0.0.1:8000/"]
        );
    }

    #[test]
    #[serial]
    fn test_healthcheck_urls_follow_port_from_env_file() {
        clear_env();
        let path = env::temp_dir().join(format!("vector-search-api-{}.env", std::process::id()));
        std::fs::write(&path, "HTTP_PORT=8123\n").unwrap();

        dotenvy::from_path(&path).unwrap();
        let urls = healthcheck_urls();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(urls, vec!["http://[::1]:8123/", "http://127.0.0.1:8123/"]);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_healthcheck_url_override() {
        clear_env();
        env::set_var("HTTP_PORT", "8123");
        env::set_var("HEALTHCHECK_URL", "http://api:9000/");

        assert_eq!(healthcheck_urls(), vec!["http://api:9000/"]);
        clear_env();
    }
}
