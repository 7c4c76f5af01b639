//! Anthropic messages API provider.
//!
//! API: https://docs.anthropic.com/en/api/messages

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use crate::sse;
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Default Anthropic API base URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires an explicit output budget.
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Streaming event envelope; only the fields we act on are decoded.
#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
}

/// Anthropic LLM client.
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client against the default endpoint.
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(DEFAULT_ANTHROPIC_URL, api_key, client)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    fn to_messages_request(&self, request: &LlmRequest, stream: bool) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
            stream,
        }
    }

    async fn send(&self, body: &MessagesRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Anthropic: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

/// Parse one streamed event payload.
fn parse_stream_payload(payload: &str, model: &str) -> Option<AppResult<LlmStreamChunk>> {
    let event: StreamEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(AppError::Stream(format!(
                "Failed to parse Anthropic event: {}",
                e
            ))))
        }
    };

    match event.kind.as_str() {
        "content_block_delta" => {
            let text = event.delta.and_then(|d| d.text).unwrap_or_default();
            if text.is_empty() {
                None
            } else {
                Some(Ok(LlmStreamChunk::delta(text, model)))
            }
        }
        "message_stop" => Some(Ok(LlmStreamChunk::finished(model, None))),
        "error" => {
            let message = event
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            Some(Err(AppError::Stream(format!(
                "Anthropic stream error: {}",
                message
            ))))
        }
        // message_start, content_block_start/stop, message_delta, ping
        _ => None,
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Anthropic");

        let body = self.to_messages_request(request, false);
        let response = self.send(&body).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Anthropic response: {}", e)))?;

        let content: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        let usage = parsed
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: parsed.model,
            usage,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::debug!(model = %request.model, "Starting streaming request to Anthropic");

        let body = self.to_messages_request(request, true);
        let response = self.send(&body).await?;

        let model = request.model.clone();
        let stream = sse::data_lines(response.bytes_stream()).filter_map(move |payload| {
            futures::future::ready(match payload {
                Ok(payload) => parse_stream_payload(&payload, &model),
                Err(e) => Some(Err(e)),
            })
        });

        Ok(Box::pin(stream))
    }
}
