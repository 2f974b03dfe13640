//! Request, result and response shapes of the search API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::store::ProductDocument;

/// Body of `POST /search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    /// Natural language query; `None` when absent or `null`
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
        }
    }

    /// The query text, or `InvalidArgument` when it is missing or empty.
    pub fn validated_query(&self) -> Result<&str, ServiceError> {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(ServiceError::query_required()),
        }
    }
}

/// A product document normalized into the fixed result shape.
///
/// `name`, `source`, `price` and `description` pass through as stored
/// (`null` when absent). The collection-typed fields and `image` fall back to
/// empty values when the document omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: Value,
    pub source: Value,
    pub price: Value,
    pub categories: Value,
    pub attributes: Value,
    pub description: Value,
    pub stock: Value,
    pub image: Value,
    pub images: Value,
}

impl SearchResult {
    /// Project a store document into a result.
    pub fn from_document(doc: &ProductDocument) -> Self {
        let passthrough = |field: &str| doc.get(field).cloned().unwrap_or(Value::Null);
        let or_default = |field: &str, default: Value| doc.get(field).cloned().unwrap_or(default);

        Self {
            id: doc.id.clone(),
            name: passthrough("name"),
            source: passthrough("source"),
            price: passthrough("price"),
            categories: or_default("categories", json!([])),
            attributes: or_default("attributes", json!({})),
            description: passthrough("description"),
            stock: or_default("stock", json!({})),
            image: or_default("image", json!("")),
            images: or_default("images", json!({})),
        }
    }
}

/// Body of a successful `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    /// Results in the store's ranking order, most similar first
    pub results: Vec<SearchResult>,
}
