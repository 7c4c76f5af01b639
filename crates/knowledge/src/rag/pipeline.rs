//! Request orchestration: index, expand, retrieve, assemble, generate.

use crate::embeddings::{resolve_embedder, EmbeddingProvider};
use crate::index::EphemeralIndex;
use crate::rag::expand::QueryExpander;
use crate::rag::generator::{AnswerStream, Generator};
use crate::rag::retriever::Retriever;
use crate::types::{ChatRequest, Document};
use docchat_core::config::RagConfig;
use docchat_core::{AppConfig, AppError, AppResult};
use docchat_llm::{ModelResolver, ProviderRegistry, ResolvedModel};
use docchat_prompt::{build_answer_prompt, AnswerContext, BuiltPrompt, ContextDocument, HistoryLine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Everything decided before generation starts.
#[derive(Debug)]
pub struct PreparedAnswer {
    /// Backend that will generate the answer
    pub resolved: ResolvedModel,

    /// Keywords returned by expansion
    pub keywords: Vec<String>,

    /// Retained documents in retrieval order
    pub documents: Vec<Arc<Document>>,

    /// Titles of the retained documents
    pub sources: Vec<String>,

    pub prompt: BuiltPrompt,
}

/// The answering pipeline shared by every request.
///
/// Holds only long-lived, read-only collaborators; each call to
/// [`answer`](Self::answer) builds its own index and discards it afterwards.
pub struct RagPipeline {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    resolver: Arc<dyn ModelResolver>,
    expander: QueryExpander,
    retriever: Retriever,
    generator: Generator,
    embed_concurrency: usize,
}

impl RagPipeline {
    /// Assemble a pipeline from explicit collaborators.
    ///
    /// With no embedder every request fails with
    /// [`AppError::NoEmbeddingProvider`].
    pub fn new(
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        resolver: Arc<dyn ModelResolver>,
        settings: &RagConfig,
    ) -> Self {
        Self {
            embedder,
            expander: QueryExpander::new(
                Arc::clone(&resolver),
                settings.expansion_model.clone(),
                settings.temperature,
            ),
            resolver,
            retriever: Retriever::new(settings.query_concurrency),
            generator: Generator::new(settings.stream_buffer, settings.temperature),
            embed_concurrency: settings.embed_concurrency.max(1),
        }
    }

    /// Build provider clients and the embedder from application config.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let registry = ProviderRegistry::from_config(&config.providers, &config.credentials)?;

        let embedder = match resolve_embedder(&config.rag, &config.providers, &config.credentials) {
            Ok(embedder) => Some(embedder),
            Err(AppError::NoEmbeddingProvider) => {
                warn!("No embedding provider configured; chat requests will fail");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self::new(embedder, Arc::new(registry), &config.rag))
    }

    /// Whether requests can be served at all.
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Answer a request as a stream of events.
    pub async fn answer(&self, request: ChatRequest) -> AppResult<AnswerStream> {
        let prepared = self.prepare(&request).await?;

        let stream = self
            .generator
            .start(&prepared.resolved, prepared.prompt.text, prepared.sources)
            .await?;

        Ok(stream)
    }

    /// Run every step up to, but not including, generation.
    ///
    /// Fails only on configuration problems: a missing embedder or no
    /// backend for the requested model. Embedding and expansion failures
    /// degrade retrieval instead.
    #[instrument(skip(self, request), fields(model = %request.model, documents = request.indexed_docs.len()))]
    pub async fn prepare(&self, request: &ChatRequest) -> AppResult<PreparedAnswer> {
        let start = Instant::now();

        let embedder = self
            .embedder
            .as_ref()
            .ok_or(AppError::NoEmbeddingProvider)?;
        let resolved = self.resolver.resolve(&request.model)?;

        // Index building and expansion are independent.
        let (index, keywords) = tokio::join!(
            EphemeralIndex::build(
                Arc::clone(embedder),
                request.indexed_docs.clone(),
                self.embed_concurrency,
            ),
            self.expander.expand(&request.message),
        );

        let retrieval = self
            .retriever
            .retrieve(&index, &request.message, &keywords)
            .await;
        let sources = retrieval.sources();

        let ctx = AnswerContext {
            documents: retrieval
                .documents
                .iter()
                .map(|doc| ContextDocument {
                    title: &doc.title,
                    content: &doc.content,
                })
                .collect(),
            history: request
                .history
                .iter()
                .map(|turn| HistoryLine {
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .collect(),
            question: &request.message,
        };
        let prompt = build_answer_prompt(&ctx)?;

        info!(
            provider = %resolved.provider,
            resolved_model = %resolved.model,
            indexed = index.len(),
            dropped = index.dropped(),
            keywords = keywords.len(),
            retained = retrieval.documents.len(),
            prompt_bytes = prompt.metadata.prompt_bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prepared answer"
        );

        Ok(PreparedAnswer {
            resolved,
            keywords,
            documents: retrieval.documents,
            sources,
            prompt,
        })
    }
}
