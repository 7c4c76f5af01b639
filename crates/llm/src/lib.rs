//! LLM integration crate for docchat.
//!
//! This crate provides a provider-agnostic abstraction for text generation.
//! Every vendor backend implements [`LlmClient`]; a [`ProviderRegistry`]
//! resolves a requested model identifier to the backend that should serve it.
//!
//! # Providers
//! - **OpenAI**: chat completions (`gpt-*` models)
//! - **Anthropic**: messages API (`claude-*` models)
//! - **Gemini**: Google generative language API, also the fallback backend
//!
//! # Example
//! ```no_run
//! use docchat_core::AppConfig;
//! use docchat_llm::{LlmRequest, ModelResolver, ProviderRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! let registry = ProviderRegistry::from_config(&config.providers, &config.credentials)?;
//! let resolved = registry.resolve("gpt-4o-mini")?;
//! let request = LlmRequest::new("Hello, world!", &resolved.model);
//! let response = resolved.client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod factory;
pub mod providers;
pub mod sse;
pub mod types;

// Re-export main types
pub use catalog::{list_models, ModelInfo};
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::{resolve_provider, ModelResolver, ProviderRegistry, ResolvedModel};
pub use providers::{AnthropicClient, GeminiClient, OpenAiClient};
pub use types::{ProviderKind, FALLBACK_GEMINI_MODEL};
