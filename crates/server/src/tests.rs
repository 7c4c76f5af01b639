//! Handler tests driven through the router with in-process backends.

use crate::auth::StaticTokenVerifier;
use crate::{router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docchat_core::config::{Credentials, RagConfig};
use docchat_core::{AppError, AppResult};
use docchat_knowledge::{EmbeddingProvider, RagPipeline};
use docchat_llm::{
    LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage, ModelResolver,
    ProviderKind, ResolvedModel,
};
use futures::stream;
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "test-token";

#[derive(Debug)]
struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    fn provider_name(&self) -> &str {
        "constant"
    }

    fn model_name(&self) -> &str {
        "constant"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

struct CannedLlm {
    chunks: Vec<&'static str>,
    fail_mid_stream: bool,
}

#[async_trait]
impl LlmClient for CannedLlm {
    fn provider_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: "refund, policy".to_string(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let mut items: Vec<AppResult<LlmStreamChunk>> = self
            .chunks
            .iter()
            .map(|c| Ok(LlmStreamChunk::delta(*c, request.model.clone())))
            .collect();
        if self.fail_mid_stream {
            items.push(Err(AppError::Stream("connection reset".to_string())));
        } else {
            items.push(Ok(LlmStreamChunk::finished(request.model.clone(), None)));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

struct SingleResolver(Arc<CannedLlm>);

impl ModelResolver for SingleResolver {
    fn resolve(&self, model: &str) -> AppResult<ResolvedModel> {
        Ok(ResolvedModel {
            provider: ProviderKind::OpenAI,
            model: model.to_string(),
            client: self.0.clone(),
        })
    }
}

fn app_with(embedder: bool, llm: CannedLlm) -> Router {
    let embedder: Option<Arc<dyn EmbeddingProvider>> = if embedder {
        Some(Arc::new(ConstantEmbedder))
    } else {
        None
    };
    let pipeline = RagPipeline::new(
        embedder,
        Arc::new(SingleResolver(Arc::new(llm))),
        &RagConfig::default(),
    );
    let credentials = Credentials {
        openai: Some("sk-test".to_string()),
        ..Credentials::default()
    };
    let verifier = Arc::new(StaticTokenVerifier::new(vec![TOKEN.to_string()]));
    router(AppState::new(pipeline, verifier, credentials))
}

fn app() -> Router {
    app_with(
        true,
        CannedLlm {
            chunks: vec!["Hel", "lo"],
            fail_mid_stream: false,
        },
    )
}

fn chat_request(body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn refund_body() -> serde_json::Value {
    serde_json::json!({
        "message": "What is the refund policy?",
        "history": [],
        "model": "gpt-4o",
        "indexedDocs": [{
            "id": "d1",
            "title": "Policy",
            "content": "Refunds within 30 days.",
            "url": "https://docs.example.com/d1",
            "lastModified": "2024-05-01T10:00:00Z"
        }]
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_chat_streams_frames() {
    let response = app()
        .oneshot(chat_request(refund_body(), Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::CONNECTION], "keep-alive");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        "data: {\"content\":\"Hel\",\"sources\":[\"Policy\"]}\n\n\
         data: {\"content\":\"lo\",\"sources\":[\"Policy\"]}\n\n\
         data: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_chat_without_documents_omits_sources() {
    let mut body = refund_body();
    body["indexedDocs"] = serde_json::json!([]);

    let response = app().oneshot(chat_request(body, Some(TOKEN))).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        "data: {\"content\":\"Hel\"}\n\ndata: {\"content\":\"lo\"}\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_chat_requires_session() {
    let response = app()
        .oneshot(chat_request(refund_body(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, serde_json::json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_unauthorized_before_body_is_parsed() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_chat_without_embedder_returns_500() {
    let app = app_with(
        false,
        CannedLlm {
            chunks: vec!["never"],
            fail_mid_stream: false,
        },
    );

    let response = app
        .oneshot(chat_request(refund_body(), Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"error": "No embedding API key available"})
    );
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request: "));
}

#[tokio::test]
async fn test_missing_field_is_json_client_error() {
    let response = app()
        .oneshot(chat_request(
            serde_json::json!({"model": "gpt-4o", "indexedDocs": []}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("message"));
}

#[tokio::test]
async fn test_mid_stream_failure_aborts_body() {
    let app = app_with(
        true,
        CannedLlm {
            chunks: vec!["partial"],
            fail_mid_stream: true,
        },
    );

    let response = app
        .oneshot(chat_request(refund_body(), Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
}

#[tokio::test]
async fn test_models_lists_configured_providers() {
    let request = Request::builder()
        .uri("/api/models")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 4);
    assert!(models.iter().all(|m| m["provider"] == "openai"));
}

#[tokio::test]
async fn test_models_requires_session() {
    let response = app()
        .oneshot(Request::builder().uri("/api/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
