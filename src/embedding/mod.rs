//! Query embedding generation.
//!
//! This module provides an `Embedder` trait and implementations:
//! - `MockEmbedder` - Deterministic vectors for testing
//! - `GeminiEmbedder` - Google Gemini `embedContent` integration

mod embedder;
mod gemini;
mod mock;

pub use embedder::Embedder;
pub use gemini::GeminiEmbedder;
pub use mock::MockEmbedder;
