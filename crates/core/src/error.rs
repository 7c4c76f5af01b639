//! Error types for docchat.
//!
//! This module defines a unified error enum covering every failure category
//! of the answering pipeline: authorization, embedding, index construction,
//! query expansion, provider resolution, and streaming, plus the ambient
//! configuration and I/O errors.

use thiserror::Error;

/// Unified error type for docchat.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// No valid session accompanied the request
    #[error("Unauthorized")]
    Unauthorized,

    /// The request body could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No embedding backend credential is configured
    #[error("No embedding API key available")]
    NoEmbeddingProvider,

    /// An embedding backend call failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A document could not be added to the similarity index
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// The keyword expansion call failed
    #[error("Query expansion error: {0}")]
    Expansion(String),

    /// No configured generation backend can serve the requested model
    #[error("No suitable model available: {0}")]
    NoProviderAvailable(String),

    /// LLM provider errors raised before streaming starts
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider failure after the answer stream was opened
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
