//! Gemini embedder using the Generative Language REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};

use super::embedder::Embedder;
use crate::error::ServiceError;
use crate::metrics;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Embedder backed by Gemini's `embedContent` endpoint.
pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiEmbedder {
    /// Create a new embedder for `model` (e.g. `models/text-embedding-004`).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{}", model)
        };

        Self {
            api_key: api_key.into(),
            model,
            base_url: GEMINI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the embedder at a different API host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/{}:embedContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let start = Instant::now();
        let preview: String = text.chars().take(50).collect();
        info!(text = %preview, model = %self.model, "Generating embeddings");

        let body = EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Embedding request failed");
                ServiceError::EmbeddingFailure(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&raw) {
                Ok(body) if !body.error.message.is_empty() => {
                    if body.error.status.is_empty() {
                        body.error.message
                    } else {
                        format!("{}: {}", body.error.status, body.error.message)
                    }
                }
                _ => raw,
            };
            error!(status = status.as_u16(), error = %message, "Embedding API returned an error");
            return Err(ServiceError::EmbeddingFailure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse embedding response");
            ServiceError::EmbeddingFailure(format!("invalid response: {}", e))
        })?;

        let values = parsed.embedding.values;
        if values.is_empty() {
            return Err(ServiceError::EmbeddingFailure(
                "empty embedding returned".to_string(),
            ));
        }

        metrics::record_embedding_latency(start.elapsed().as_secs_f64() * 1000.0);
        debug!(dimensions = values.len(), "Embeddings generated successfully");

        Ok(values)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
