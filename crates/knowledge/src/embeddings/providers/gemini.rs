//! Gemini embedding provider (`text-embedding-004`).

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const GEMINI_EMBEDDING_DIMENSIONS: usize = 768;

/// Gemini embedding provider using the batch embed endpoint.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbeddings {
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, GEMINI_EMBEDDING_MODEL
        )
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_name(&self) -> &str {
        GEMINI_EMBEDDING_MODEL
    }

    fn dimensions(&self) -> usize {
        GEMINI_EMBEDDING_DIMENSIONS
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{}", GEMINI_EMBEDDING_MODEL),
                    content: Content {
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        };

        debug!("Sending embedding request to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Gemini embedding error ({}): {}",
                status, error_text
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Gemini response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Gemini returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let provider = GeminiEmbeddings::with_base_url(
            "https://example.test/",
            "key",
            reqwest::Client::new(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/text-embedding-004:batchEmbedContents"
        );
    }

    #[test]
    fn test_request_shape() {
        let body = BatchEmbedRequest {
            requests: vec![EmbedContentRequest {
                model: "models/text-embedding-004".to_string(),
                content: Content {
                    parts: vec![Part { text: "hello" }],
                },
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"requests": [{"model": "models/text-embedding-004", "content": {"parts": [{"text": "hello"}]}}]})
        );
    }

    #[test]
    fn test_parse_response() {
        let parsed: BatchEmbedResponse =
            serde_json::from_str(r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3]}]}"#)
                .unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3]);
    }
}
