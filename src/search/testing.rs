//! Counting stub clients shared by the unit tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::embedding::Embedder;
use crate::error::ServiceError;
use crate::store::{DocumentStore, NearestQuery, ProductDocument};

pub(crate) fn product(id: &str, fields: Value) -> ProductDocument {
    let fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ProductDocument::new(id, fields)
}

pub(crate) struct StubEmbedder {
    result: Result<Vec<f32>, String>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub(crate) fn returning(vector: Vec<f32>) -> Self {
        Self {
            result: Ok(vector),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(ServiceError::EmbeddingFailure)
    }

    fn model(&self) -> &str {
        "stub"
    }
}

pub(crate) struct StubStore {
    result: Result<Vec<ProductDocument>, String>,
    calls: AtomicUsize,
    last_query: Mutex<Option<NearestQuery>>,
}

impl StubStore {
    pub(crate) fn returning(docs: Vec<ProductDocument>) -> Self {
        Self {
            result: Ok(docs),
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_query(&self) -> Option<NearestQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for StubStore {
    async fn find_nearest(&self, query: &NearestQuery) -> Result<Vec<ProductDocument>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        self.result.clone().map_err(ServiceError::SearchFailure)
    }

    fn collection(&self) -> &str {
        "stub_products"
    }
}
