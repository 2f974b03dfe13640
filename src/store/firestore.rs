//! Cloud Firestore store using the REST `runQuery` endpoint with `findNearest`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::auth::TokenProvider;
use super::document_store::{DocumentStore, NearestQuery, ProductDocument};
use crate::error::ServiceError;
use crate::metrics;

const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com";

/// Document store backed by a Firestore collection with a vector index.
pub struct FirestoreStore {
    project_id: String,
    database: String,
    collection: String,
    base_url: String,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// One element of the `runQuery` response array.
#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    document: Option<RawDocument>,
    /// Set when the query fails after the response has started streaming.
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    /// Create a store over `collection` in the project's `(default)` database.
    pub fn new(
        project_id: impl Into<String>,
        collection: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            collection: collection.into(),
            base_url: FIRESTORE_API_URL.to_string(),
            client: Client::new(),
            tokens,
        }
    }

    /// Point the store at a different API host (emulator or tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents:runQuery",
            self.base_url, self.project_id, self.database
        )
    }

    /// Build the `runQuery` request body for a nearest-neighbor query.
    fn query_body(&self, query: &NearestQuery) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "findNearest": {
                    "vectorField": { "fieldPath": query.vector_field },
                    "queryVector": encode_vector(&query.query_vector),
                    "distanceMeasure": query.distance_measure.as_str(),
                    "limit": query.limit,
                }
            }
        })
    }
}

/// Encode a vector the way Firestore stores `Vector` values.
fn encode_vector(values: &[f32]) -> Value {
    let values: Vec<Value> = values
        .iter()
        .map(|v| json!({ "doubleValue": *v as f64 }))
        .collect();
    json!({
        "mapValue": {
            "fields": {
                "__type__": { "stringValue": "__vector__" },
                "value": { "arrayValue": { "values": values } }
            }
        }
    })
}

/// Decode a Firestore typed value into plain JSON.
///
/// Vectors decode to plain numeric arrays; unknown shapes decode to `null`.
fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            // NaN and infinities arrive as strings and have no JSON form.
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let is_vector = fields
                .get("__type__")
                .and_then(|t| t.get("stringValue"))
                .and_then(Value::as_str)
                == Some("__vector__");
            if is_vector {
                fields.get("value").map(decode_value).unwrap_or(json!([]))
            } else {
                Value::Object(decode_fields(&fields))
            }
        }
        _ => Value::Null,
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Pull the API's error message out of an error response body.
///
/// `runQuery` reports errors either as a bare `{"error": ...}` object or as
/// the first element of the streamed array.
fn api_error_message(raw: &str) -> String {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return raw.to_string(),
    };
    let error = match &parsed {
        Value::Array(items) => items.first().and_then(|i| i.get("error")),
        other => other.get("error"),
    };
    error
        .and_then(error_message)
        .unwrap_or_else(|| raw.to_string())
}

fn error_message(error: &Value) -> Option<String> {
    error.get("message").and_then(Value::as_str).map(str::to_string)
}

/// Collect the streamed documents, failing if any entry carries an error.
fn parse_documents(entries: Vec<RunQueryEntry>) -> Result<Vec<ProductDocument>, ServiceError> {
    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(error) = entry.error {
            let code = error.get("code").and_then(Value::as_u64).unwrap_or(0);
            let message = error_message(&error).unwrap_or_else(|| error.to_string());
            return Err(ServiceError::SearchFailure(format!("HTTP {}: {}", code, message)));
        }
        if let Some(doc) = entry.document {
            documents.push(ProductDocument::new(
                document_id(&doc.name),
                decode_fields(&doc.fields),
            ));
        }
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn find_nearest(&self, query: &NearestQuery) -> Result<Vec<ProductDocument>, ServiceError> {
        let start = Instant::now();
        info!(
            collection = %self.collection,
            vector_field = %query.vector_field,
            distance = query.distance_measure.as_str(),
            limit = query.limit,
            "Performing vector search in Firestore"
        );

        let token = self.tokens.access_token().await.map_err(|e| {
            error!(error = %e, "Failed to obtain Firestore access token");
            ServiceError::SearchFailure(e.to_string())
        })?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(token)
            .json(&self.query_body(query))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Firestore request failed");
                ServiceError::SearchFailure(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = api_error_message(&raw);
            error!(status = status.as_u16(), error = %message, "Firestore returned an error");
            return Err(ServiceError::SearchFailure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let entries: Vec<RunQueryEntry> = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Firestore response");
            ServiceError::SearchFailure(format!("invalid response: {}", e))
        })?;

        let documents = parse_documents(entries).map_err(|e| {
            error!(error = %e, "Firestore query failed mid-stream");
            e
        })?;
        metrics::record_store_latency(start.elapsed().as_secs_f64() * 1000.0);
        info!(documents = documents.len(), "Firestore vector search completed");

        Ok(documents)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
