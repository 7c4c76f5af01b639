//! Embedding backends.
//!
//! Every backend maps text to a fixed-length vector. Which backend serves a
//! process is decided once from the configured credentials.

pub mod provider;
pub mod providers;

pub use provider::{resolve_embedder, EmbeddingProvider};
