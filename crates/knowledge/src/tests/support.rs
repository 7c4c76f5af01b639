//! In-process fakes for embedding and generation backends.

use crate::embeddings::EmbeddingProvider;
use crate::types::Document;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docchat_core::{AppError, AppResult};
use docchat_llm::{
    LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage, ModelResolver,
    ProviderKind, ResolvedModel,
};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn doc(id: &str, title: &str, content: &str) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        url: format!("https://docs.example.com/{}", id),
        last_modified: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    }
}

/// Embeds text as term counts over a fixed vocabulary.
#[derive(Debug)]
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    fail_marker: Option<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|t| t.to_string()).collect(),
            fail_marker: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail any text containing `marker`.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(AppError::Embedding(format!("refused '{}'", text)));
            }
        }
        let lower = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|term| lower.matches(term.as_str()).count() as f32)
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.vector(text)).collect()
    }
}

/// How a scripted answer stream ends after its chunks.
#[derive(Debug, Clone)]
pub enum StreamTail {
    /// Provider end-of-stream marker
    Finished,
    /// Stream ends without a marker
    Exhausted,
    /// Mid-stream failure
    Error(String),
    /// Never yields again
    Pending,
}

/// Sets a flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Generation backend replaying canned output.
pub struct ScriptedLlm {
    pub keywords: Result<String, String>,
    pub chunks: Vec<String>,
    pub tail: StreamTail,
    pub open_error: Option<String>,
    pub stream_dropped: Arc<AtomicBool>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(keywords: &str, chunks: &[&str]) -> Self {
        Self {
            keywords: Ok(keywords.to_string()),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            tail: StreamTail::Finished,
            open_error: None,
            stream_dropped: Arc::new(AtomicBool::new(false)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_keyword_error(mut self, message: &str) -> Self {
        self.keywords = Err(message.to_string());
        self
    }

    pub fn with_tail(mut self, tail: StreamTail) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_open_error(mut self, message: &str) -> Self {
        self.open_error = Some(message.to_string());
        self
    }

    pub fn recorded(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.keywords {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.open_error {
            return Err(AppError::Llm(message.clone()));
        }

        let model = request.model.clone();
        let body: Vec<AppResult<LlmStreamChunk>> = self
            .chunks
            .iter()
            .map(|c| Ok(LlmStreamChunk::delta(c.clone(), model.clone())))
            .collect();

        let tail = match &self.tail {
            StreamTail::Finished => {
                stream::iter(vec![Ok(LlmStreamChunk::finished(model, None))]).boxed()
            }
            StreamTail::Exhausted => stream::empty().boxed(),
            StreamTail::Error(message) => {
                stream::iter(vec![Err(AppError::Stream(message.clone()))]).boxed()
            }
            StreamTail::Pending => stream::pending().boxed(),
        };

        let guard = DropFlag(Arc::clone(&self.stream_dropped));
        let stream = stream::iter(body).chain(tail).map(move |item| {
            let _ = &guard;
            item
        });

        Ok(Box::pin(stream))
    }
}

/// Resolves every model to one backend.
pub struct FixedResolver {
    pub client: Arc<ScriptedLlm>,
    pub available: bool,
}

impl FixedResolver {
    pub fn new(client: Arc<ScriptedLlm>) -> Self {
        Self {
            client,
            available: true,
        }
    }

    pub fn unavailable(client: Arc<ScriptedLlm>) -> Self {
        Self {
            client,
            available: false,
        }
    }
}

impl ModelResolver for FixedResolver {
    fn resolve(&self, model: &str) -> AppResult<ResolvedModel> {
        if !self.available {
            return Err(AppError::NoProviderAvailable(format!(
                "no configured provider can serve model '{}'",
                model
            )));
        }
        Ok(ResolvedModel {
            provider: ProviderKind::Gemini,
            model: model.to_string(),
            client: Arc::clone(&self.client) as Arc<dyn LlmClient>,
        })
    }
}
