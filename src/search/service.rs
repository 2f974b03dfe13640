//! Search orchestrator tying the embedder and the document store together.

use std::sync::Arc;
use tracing::{error, info};

use super::types::SearchResult;
use crate::embedding::Embedder;
use crate::error::ServiceError;
use crate::store::{DistanceMeasure, DocumentStore, NearestQuery};

/// Document field holding the stored product embeddings.
pub const VECTOR_FIELD: &str = "embedding";

/// Maximum number of results per search.
pub const RESULT_LIMIT: u32 = 10;

/// Runs one search: embed, query, shape.
///
/// Both clients are built once at startup and shared read-only across
/// requests. Nothing is cached between calls.
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
}

impl SearchService {
    /// Create a new SearchService over the given clients.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store }
    }

    /// Perform a semantic search for `query`.
    ///
    /// # Returns
    /// Results in the store's ranking order, possibly empty.
    ///
    /// # Errors
    /// - `EmbeddingFailure` if the embedder fails; the store is not queried.
    /// - `SearchFailure` if the store query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        info!(query = %query, "Starting search");

        let query_vector = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "Embedding generation failed");
            e
        })?;
        info!(dimensions = query_vector.len(), "Query embedding generated");

        let nearest = NearestQuery {
            vector_field: VECTOR_FIELD.to_string(),
            query_vector,
            distance_measure: DistanceMeasure::Cosine,
            limit: RESULT_LIMIT,
        };

        let documents = self.store.find_nearest(&nearest).await.map_err(|e| {
            error!(error = %e, collection = %self.store.collection(), "Search failed");
            e
        })?;

        let results: Vec<SearchResult> = documents.iter().map(SearchResult::from_document).collect();
        info!(results = results.len(), "Search completed");

        Ok(results)
    }

    /// Model used for query embeddings.
    pub fn embedding_model(&self) -> &str {
        self.embedder.model()
    }

    /// Collection searched by this service.
    pub fn collection(&self) -> &str {
        self.store.collection()
    }
}
