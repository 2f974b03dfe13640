//! DocumentStore trait and the nearest-neighbor query it executes.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ServiceError;

/// Distance measure used to rank stored vectors against the query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMeasure {
    Euclidean,
    Cosine,
    DotProduct,
}

impl DistanceMeasure {
    /// Wire name understood by Firestore.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMeasure::Euclidean => "EUCLIDEAN",
            DistanceMeasure::Cosine => "COSINE",
            DistanceMeasure::DotProduct => "DOT_PRODUCT",
        }
    }
}

/// A nearest-neighbor query against one vector field.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestQuery {
    /// Document field holding the stored vectors
    pub vector_field: String,
    /// Vector to compare against
    pub query_vector: Vec<f32>,
    pub distance_measure: DistanceMeasure,
    /// Maximum number of documents to return
    pub limit: u32,
}

/// A document as returned by the store, before any reshaping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductDocument {
    /// Document id (last segment of the document path)
    pub id: String,
    /// Decoded document fields
    pub fields: Map<String, Value>,
}

impl ProductDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Field lookup; `None` when the document omits the field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Trait defining the interface for vector-search document stores.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a nearest-neighbor query.
    ///
    /// # Returns
    /// Matching documents, most similar first. The order is the store's
    /// ranking and is passed through untouched by callers.
    ///
    /// # Errors
    /// Returns `ServiceError::SearchFailure` on connectivity, auth, quota or
    /// query errors.
    async fn find_nearest(&self, query: &NearestQuery) -> Result<Vec<ProductDocument>, ServiceError>;

    /// Name of the collection being searched.
    fn collection(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_measure_wire_names() {
        assert_eq!(DistanceMeasure::Cosine.as_str(), "COSINE");
        assert_eq!(DistanceMeasure::Euclidean.as_str(), "EUCLIDEAN");
        assert_eq!(DistanceMeasure::DotProduct.as_str(), "DOT_PRODUCT");
    }
}
