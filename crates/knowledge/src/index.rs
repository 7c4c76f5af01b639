//! Request-scoped in-memory vector index.
//!
//! An [`EphemeralIndex`] is built from the documents of a single request,
//! queried a handful of times and then dropped. Nothing is persisted and
//! nothing is shared between requests.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Document, RetrievedMatch};
use docchat_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A document together with the vector of its content.
#[derive(Debug)]
struct IndexedDocument {
    document: Arc<Document>,
    embedding: Vec<f32>,
}

/// In-memory nearest-neighbour index over one request's documents.
#[derive(Debug)]
pub struct EphemeralIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: Vec<IndexedDocument>,
    dropped: usize,
}

impl EphemeralIndex {
    /// Embed every document's content and index it.
    ///
    /// Up to `concurrency` embedding calls are in flight at once. A document
    /// whose embedding fails is left out of the index and counted in
    /// [`dropped`](Self::dropped); the remaining documents are still usable.
    /// Repeated ids keep their first occurrence.
    #[instrument(skip(embedder, documents), fields(documents = documents.len()))]
    pub async fn build(
        embedder: Arc<dyn EmbeddingProvider>,
        documents: Vec<Document>,
        concurrency: usize,
    ) -> Self {
        let mut seen = HashSet::new();
        let unique: Vec<Document> = documents
            .into_iter()
            .filter(|doc| {
                let first = seen.insert(doc.id.clone());
                if !first {
                    warn!(id = %doc.id, "Ignoring duplicate document id");
                }
                first
            })
            .collect();

        let provider = &embedder;
        let embedded: Vec<(Document, AppResult<Vec<f32>>)> = stream::iter(unique)
            .map(|doc| async move {
                let result = provider.embed(&doc.content).await;
                (doc, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut entries = Vec::with_capacity(embedded.len());
        let mut dropped = 0;
        for (doc, result) in embedded {
            match result {
                Ok(embedding) => entries.push(IndexedDocument {
                    document: Arc::new(doc),
                    embedding,
                }),
                Err(e) => {
                    let err = AppError::IndexBuild(format!("document '{}': {}", doc.id, e));
                    warn!("Dropping document from index: {}", err);
                    dropped += 1;
                }
            }
        }

        debug!(
            indexed = entries.len(),
            dropped,
            provider = embedder.provider_name(),
            "Ephemeral index built"
        );

        Self {
            embedder,
            entries,
            dropped,
        }
    }

    /// Embed `text` and return the `k` most similar documents.
    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<RetrievedMatch>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text).await?;
        Ok(self.search_vector(&vector, k))
    }

    /// Return the `k` documents most similar to `query`.
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// the order in which documents were supplied.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Vec<RetrievedMatch> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(query, &entry.embedding)))
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(position, score)| RetrievedMatch {
                document: Arc::clone(&self.entries[position].document),
                score,
            })
            .collect()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents left out because their embedding failed.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Cosine similarity of two vectors, 0.0 when undefined.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
