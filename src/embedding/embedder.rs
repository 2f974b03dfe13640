//! Embedder trait defining the interface for text embedding services.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Trait defining the interface for text embedding services.
///
/// Implementations include:
/// - `MockEmbedder` - Deterministic vectors for testing
/// - `GeminiEmbedder` - Google Gemini integration
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Compute the embedding vector for `text`.
    ///
    /// # Errors
    /// Returns `ServiceError::EmbeddingFailure` for any network, auth, quota or
    /// content error reported by the backing service.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;

    /// Name of the model producing the vectors.
    fn model(&self) -> &str;
}
