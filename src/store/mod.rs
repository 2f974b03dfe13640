//! Vector-search document store.
//!
//! This module provides a `DocumentStore` trait and implementations:
//! - `MockStore` - Fixed sample catalog for testing
//! - `FirestoreStore` - Cloud Firestore `findNearest` over REST
//!
//! plus the access-token plumbing the Firestore client authenticates with.

mod auth;
mod document_store;
mod firestore;
mod mock;

pub use auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use document_store::{DistanceMeasure, DocumentStore, NearestQuery, ProductDocument};
pub use firestore::FirestoreStore;
pub use mock::MockStore;
