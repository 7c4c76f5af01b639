//! Provider identity types.

use serde::{Deserialize, Serialize};

/// Gemini model used when the requested model is not a Gemini model.
pub const FALLBACK_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Supported generation/embedding vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    /// Google's Gemini API (reported as "google" on the wire)
    #[serde(rename = "google")]
    Gemini,
}

impl ProviderKind {
    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "google",
        }
    }

    /// Substring that identifies this vendor's model names.
    pub fn model_marker(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt",
            Self::Anthropic => "claude",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
