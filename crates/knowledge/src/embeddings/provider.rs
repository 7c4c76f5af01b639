//! Embedding provider trait and resolution.

use crate::embeddings::providers::{GeminiEmbeddings, OpenAiEmbeddings, TrigramProvider};
use docchat_core::config::{Credentials, ProvidersConfig, RagConfig};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "google", "openai", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Pick the embedding backend for this process.
///
/// Gemini is preferred, then OpenAI. The local trigram embedder is used only
/// when explicitly enabled. With none of these available the caller gets
/// [`AppError::NoEmbeddingProvider`].
pub fn resolve_embedder(
    rag: &RagConfig,
    providers: &ProvidersConfig,
    credentials: &Credentials,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    if credentials.gemini.is_none() && credentials.openai.is_none() {
        if rag.local_embeddings {
            tracing::info!("Using local trigram embeddings");
            return Ok(Arc::new(TrigramProvider::default()));
        }
        return Err(AppError::NoEmbeddingProvider);
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(providers.request_timeout_secs))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let provider: Arc<dyn EmbeddingProvider> = if let Some(key) = &credentials.gemini {
        let base = providers
            .gemini
            .endpoint
            .as_deref()
            .unwrap_or(docchat_llm::providers::gemini::DEFAULT_GEMINI_URL);
        Arc::new(GeminiEmbeddings::with_base_url(base, key.clone(), http))
    } else if let Some(key) = &credentials.openai {
        let base = providers
            .openai
            .endpoint
            .as_deref()
            .unwrap_or(docchat_llm::providers::openai::DEFAULT_OPENAI_URL);
        Arc::new(OpenAiEmbeddings::with_base_url(base, key.clone(), http))
    } else {
        return Err(AppError::NoEmbeddingProvider);
    };

    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        dimensions = provider.dimensions(),
        "Embedding provider selected"
    );

    Ok(provider)
}
