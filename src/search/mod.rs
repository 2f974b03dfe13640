//! Search orchestration: embed the query, run the nearest-neighbor lookup,
//! shape the documents into results.

mod service;
mod types;

pub use service::{SearchService, RESULT_LIMIT, VECTOR_FIELD};
pub use types::{SearchRequest, SearchResponse, SearchResult};

#[cfg(test)]
pub(crate) mod testing;
