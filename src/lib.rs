//! Vector search API library.
//!
//! This library exposes the core modules for integration testing while
//! keeping the actual binary entry point in main.rs.

pub mod config;
pub mod embedding;
pub mod error;
pub mod http;
pub mod metrics;
pub mod search;
pub mod store;
