//! Mock store implementation for testing without Firestore.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use super::document_store::{DocumentStore, NearestQuery, ProductDocument};
use crate::error::ServiceError;

/// Mock store that serves a small fixed product catalog.
///
/// Documents come back in catalog order, truncated to the query's limit. The
/// query vector is only checked for emptiness; no similarity is computed.
pub struct MockStore {
    collection: String,
    catalog: Vec<ProductDocument>,
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl MockStore {
    /// Create a new mock store with the sample catalog.
    pub fn new() -> Self {
        info!("Initializing MockStore with sample product data");
        let catalog = vec![
            ProductDocument::new(
                "mock-001",
                fields(json!({
                    "name": "Trail Running Shoes",
                    "source": "mock-outfitters",
                    "price": 89.99,
                    "categories": ["footwear", "running"],
                    "attributes": { "color": "red", "drop_mm": 6 },
                    "description": "Lightweight trail shoe with aggressive lugs.",
                    "stock": { "42": 3, "43": 0 },
                    "image": "https://example.com/img/trail.jpg",
                    "images": { "side": "https://example.com/img/trail-side.jpg" }
                })),
            ),
            ProductDocument::new(
                "mock-002",
                fields(json!({
                    "name": "Road Racing Flats",
                    "source": "mock-outfitters",
                    "price": 129.0,
                    "categories": ["footwear", "racing"],
                    "description": "Carbon-plated flat for race day."
                })),
            ),
            ProductDocument::new(
                "mock-003",
                fields(json!({
                    "name": "Merino Running Socks",
                    "source": "sock-depot",
                    "price": 14.5,
                    "description": null
                })),
            ),
        ];

        Self {
            collection: "mock://combined_products".to_string(),
            catalog,
        }
    }

    /// Create a mock store serving `catalog` verbatim.
    pub fn with_catalog(catalog: Vec<ProductDocument>) -> Self {
        Self {
            collection: "mock://combined_products".to_string(),
            catalog,
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn find_nearest(&self, query: &NearestQuery) -> Result<Vec<ProductDocument>, ServiceError> {
        if query.query_vector.is_empty() {
            return Err(ServiceError::SearchFailure(
                "query vector must not be empty".into(),
            ));
        }

        let docs: Vec<ProductDocument> = self
            .catalog
            .iter()
            .take(query.limit as usize)
            .cloned()
            .collect();

        info!(documents = docs.len(), "Mock vector search completed");
        Ok(docs)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DistanceMeasure;

    fn nearest(vector: Vec<f32>, limit: u32) -> NearestQuery {
        NearestQuery {
            vector_field: "embedding".into(),
            query_vector: vector,
            distance_measure: DistanceMeasure::Cosine,
            limit,
        }
    }

    #[tokio::test]
    async fn test_mock_store_returns_catalog_in_order() {
        let store = MockStore::new();
        let docs = store.find_nearest(&nearest(vec![1.0], 10)).await.unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["mock-001", "mock-002", "mock-003"]);
    }

    #[tokio::test]
    async fn test_mock_store_respects_limit() {
        let store = MockStore::new();
        let docs = store.find_nearest(&nearest(vec![1.0], 2)).await.unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_store_rejects_empty_vector() {
        let store = MockStore::new();
        let result = store.find_nearest(&nearest(vec![], 10)).await;
        assert!(matches!(result, Err(ServiceError::SearchFailure(_))));
    }

    #[tokio::test]
    async fn test_custom_catalog_served_verbatim() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Only Item"));
        let store = MockStore::with_catalog(vec![ProductDocument::new("only", fields)]);

        let docs = store.find_nearest(&nearest(vec![1.0], 10)).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("name"), Some(&json!("Only Item")));
    }

    #[test]
    fn test_collection_name() {
        assert!(MockStore::new().collection().starts_with("mock://"));
    }
}
