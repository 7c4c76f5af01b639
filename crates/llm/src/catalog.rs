//! Static catalog of selectable generation models.

use crate::types::ProviderKind;
use docchat_core::config::Credentials;
use serde::{Deserialize, Serialize};

/// A model offered to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: ProviderKind,
    pub available: bool,
}

const OPENAI_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "GPT-4o Mini"),
    ("gpt-4-turbo", "GPT-4 Turbo"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
];

const GEMINI_MODELS: &[(&str, &str)] = &[
    ("gemini-1.5-pro", "Gemini 1.5 Pro"),
    ("gemini-1.5-flash", "Gemini 1.5 Flash"),
    ("gemini-1.0-pro", "Gemini 1.0 Pro"),
];

const ANTHROPIC_MODELS: &[(&str, &str)] = &[
    ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet"),
    ("claude-3-5-haiku-20241022", "Claude 3.5 Haiku"),
    ("claude-3-opus-20240229", "Claude 3 Opus"),
];

/// List the models whose provider credential is configured.
///
/// Order: OpenAI, Google, Anthropic.
pub fn list_models(credentials: &Credentials) -> Vec<ModelInfo> {
    let groups = [
        (ProviderKind::OpenAI, credentials.openai.is_some(), OPENAI_MODELS),
        (ProviderKind::Gemini, credentials.gemini.is_some(), GEMINI_MODELS),
        (ProviderKind::Anthropic, credentials.anthropic.is_some(), ANTHROPIC_MODELS),
    ];

    groups
        .iter()
        .filter(|(_, configured, _)| *configured)
        .flat_map(|(provider, _, models)| {
            models.iter().map(move |(id, name)| ModelInfo {
                id: id.to_string(),
                name: name.to_string(),
                provider: *provider,
                available: true,
            })
        })
        .collect()
}
