//! Multi-query retrieval with deduplication.

use crate::index::EphemeralIndex;
use crate::types::{Document, RetrievedMatch};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Matches requested per query.
pub const PER_QUERY_K: usize = 3;

/// Documents kept for the context block.
pub const MAX_CONTEXT_DOCUMENTS: usize = 8;

/// Documents selected for one answer.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Distinct documents in first-seen order
    pub documents: Vec<Arc<Document>>,

    /// Queries whose embedding failed and were skipped
    pub failed_queries: usize,
}

impl Retrieval {
    /// Citation labels, one per retained document.
    pub fn sources(&self) -> Vec<String> {
        self.documents.iter().map(|doc| doc.title.clone()).collect()
    }
}

/// Runs the question and each keyword against an index.
#[derive(Debug, Clone)]
pub struct Retriever {
    concurrency: usize,
}

impl Retriever {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Query the index with `question` followed by every keyword.
    ///
    /// Queries run concurrently but results are merged in issue order, so
    /// the outcome does not depend on which query finishes first.
    pub async fn retrieve(
        &self,
        index: &EphemeralIndex,
        question: &str,
        keywords: &[String],
    ) -> Retrieval {
        if index.is_empty() {
            return Retrieval::default();
        }

        let queries: Vec<String> = std::iter::once(question.to_string())
            .chain(keywords.iter().cloned())
            .collect();

        let results: Vec<Vec<RetrievedMatch>> = stream::iter(queries)
            .map(|query: String| async move {
                match index.query(&query, PER_QUERY_K).await {
                    Ok(matches) => Some(matches),
                    Err(e) => {
                        warn!(query = %query, "Skipping query whose embedding failed: {}", e);
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        let issued = keywords.len() + 1;
        let failed_queries = issued - results.len();
        let documents = merge_matches(results);

        debug!(
            queries = issued,
            failed_queries,
            retained = documents.len(),
            "Retrieval complete"
        );

        Retrieval {
            documents,
            failed_queries,
        }
    }
}

/// Concatenate per-query matches, keep the first occurrence of each
/// document id and cap the result at [`MAX_CONTEXT_DOCUMENTS`].
pub fn merge_matches(per_query: Vec<Vec<RetrievedMatch>>) -> Vec<Arc<Document>> {
    let mut seen = HashSet::new();
    per_query
        .into_iter()
        .flatten()
        .filter(|m| seen.insert(m.document.id.clone()))
        .map(|m| m.document)
        .take(MAX_CONTEXT_DOCUMENTS)
        .collect()
}
