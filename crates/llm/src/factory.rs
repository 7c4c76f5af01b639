//! LLM provider resolution.
//!
//! This module maps a requested model identifier onto the backend that
//! should serve it. Resolution depends only on the model name and on which
//! provider credentials are configured. Markers are matched case-sensitively
//! against the name as given:
//!
//! 1. `gpt` models go to OpenAI when an OpenAI key is present
//! 2. `claude` models go to Anthropic when an Anthropic key is present
//! 3. anything else falls back to Gemini when a Gemini key is present,
//!    substituting a default Gemini model for non-Gemini names
//! 4. otherwise no provider is available

use crate::client::LlmClient;
use crate::providers::{AnthropicClient, GeminiClient, OpenAiClient};
use crate::types::{ProviderKind, FALLBACK_GEMINI_MODEL};
use docchat_core::config::{Credentials, ProvidersConfig};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// A model identifier bound to the client that serves it.
#[derive(Clone)]
pub struct ResolvedModel {
    pub provider: ProviderKind,
    /// Model name to send to the provider (may differ from the requested one)
    pub model: String,
    pub client: Arc<dyn LlmClient>,
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish()
    }
}

/// Resolves model identifiers to generation backends.
pub trait ModelResolver: Send + Sync {
    fn resolve(&self, model: &str) -> AppResult<ResolvedModel>;
}

/// Decide which provider serves `model` given the configured credentials.
///
/// Returns the provider and the model name to request from it.
pub fn resolve_provider(model: &str, credentials: &Credentials) -> AppResult<(ProviderKind, String)> {
    if model.contains(ProviderKind::OpenAI.model_marker()) && credentials.openai.is_some() {
        return Ok((ProviderKind::OpenAI, model.to_string()));
    }

    if model.contains(ProviderKind::Anthropic.model_marker()) && credentials.anthropic.is_some() {
        return Ok((ProviderKind::Anthropic, model.to_string()));
    }

    if credentials.gemini.is_some() {
        let gemini_model = if model.contains(ProviderKind::Gemini.model_marker()) {
            model.to_string()
        } else {
            FALLBACK_GEMINI_MODEL.to_string()
        };
        return Ok((ProviderKind::Gemini, gemini_model));
    }

    Err(AppError::NoProviderAvailable(format!(
        "no configured provider can serve model '{}'",
        model
    )))
}

/// Generation clients for every provider with a configured credential.
///
/// Built once at startup; clients share one HTTP connection pool.
pub struct ProviderRegistry {
    credentials: Credentials,
    openai: Option<Arc<dyn LlmClient>>,
    anthropic: Option<Arc<dyn LlmClient>>,
    gemini: Option<Arc<dyn LlmClient>>,
}

impl ProviderRegistry {
    /// Build clients from provider settings and resolved credentials.
    pub fn from_config(providers: &ProvidersConfig, credentials: &Credentials) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(providers.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let openai = credentials.openai.as_ref().map(|key| {
            let base = providers
                .openai
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::openai::DEFAULT_OPENAI_URL);
            Arc::new(OpenAiClient::with_base_url(base, key.clone(), http.clone()))
                as Arc<dyn LlmClient>
        });

        let anthropic = credentials.anthropic.as_ref().map(|key| {
            let base = providers
                .anthropic
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::anthropic::DEFAULT_ANTHROPIC_URL);
            Arc::new(AnthropicClient::with_base_url(base, key.clone(), http.clone()))
                as Arc<dyn LlmClient>
        });

        let gemini = credentials.gemini.as_ref().map(|key| {
            let base = providers
                .gemini
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::gemini::DEFAULT_GEMINI_URL);
            Arc::new(GeminiClient::with_base_url(base, key.clone(), http.clone()))
                as Arc<dyn LlmClient>
        });

        tracing::debug!(
            openai = openai.is_some(),
            anthropic = anthropic.is_some(),
            gemini = gemini.is_some(),
            "Provider registry initialized"
        );

        Ok(Self {
            credentials: credentials.clone(),
            openai,
            anthropic,
            gemini,
        })
    }

    fn client(&self, kind: ProviderKind) -> Option<&Arc<dyn LlmClient>> {
        match kind {
            ProviderKind::OpenAI => self.openai.as_ref(),
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
        }
    }
}

impl ModelResolver for ProviderRegistry {
    fn resolve(&self, model: &str) -> AppResult<ResolvedModel> {
        let (provider, resolved_model) = resolve_provider(model, &self.credentials)?;

        let client = self.client(provider).cloned().ok_or_else(|| {
            AppError::NoProviderAvailable(format!("{} client is not initialized", provider))
        })?;

        if resolved_model != model {
            tracing::debug!(
                requested = %model,
                resolved = %resolved_model,
                "Substituted fallback model"
            );
        }

        Ok(ResolvedModel {
            provider,
            model: resolved_model,
            client,
        })
    }
}
