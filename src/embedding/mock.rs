//! Mock embedder for running without Gemini credentials.

use async_trait::async_trait;
use tracing::info;

use super::embedder::Embedder;
use crate::error::ServiceError;

/// Dimensionality of the vectors produced by `MockEmbedder`.
pub const MOCK_DIMENSIONS: usize = 8;

/// Mock embedder that derives a small deterministic vector from the text.
///
/// Each byte of the input is folded into one of `MOCK_DIMENSIONS` buckets and
/// the result is L2-normalized, so equal texts always produce equal vectors.
pub struct MockEmbedder {
    model: String,
}

impl MockEmbedder {
    /// Create a new mock embedder.
    pub fn new() -> Self {
        info!("Initializing MockEmbedder");
        Self {
            model: "mock://hash-embedding".to_string(),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; MOCK_DIMENSIONS];
        for (i, byte) in text.bytes().enumerate() {
            buckets[(byte as usize + i) % MOCK_DIMENSIONS] += byte as f32;
        }

        let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            buckets.iter_mut().for_each(|v| *v /= norm);
        }
        buckets
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        if text.is_empty() {
            return Err(ServiceError::EmbeddingFailure(
                "cannot embed empty content".into(),
            ));
        }
        Ok(Self::vectorize(text))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
