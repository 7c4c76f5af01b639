//! Keyword expansion of the user's question.

use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmRequest, ModelResolver};
use docchat_prompt::build_expansion_prompt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Asks a fast model for search keywords related to a question.
///
/// Expansion only widens retrieval, so it never fails the request: any
/// error yields an empty keyword list.
pub struct QueryExpander {
    resolver: Arc<dyn ModelResolver>,
    model: String,
    temperature: f32,
}

impl QueryExpander {
    pub fn new(resolver: Arc<dyn ModelResolver>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            resolver,
            model: model.into(),
            temperature,
        }
    }

    /// Keywords for `question`, empty on any failure.
    pub async fn expand(&self, question: &str) -> Vec<String> {
        match self.try_expand(question).await {
            Ok(keywords) => {
                debug!(count = keywords.len(), ?keywords, "Expanded question");
                keywords
            }
            Err(e) => {
                warn!("{}; retrieving with the question only", e);
                Vec::new()
            }
        }
    }

    async fn try_expand(&self, question: &str) -> AppResult<Vec<String>> {
        let resolved = self
            .resolver
            .resolve(&self.model)
            .map_err(|e| AppError::Expansion(e.to_string()))?;
        let prompt = build_expansion_prompt(question)?;
        let request = LlmRequest::new(prompt, &resolved.model).with_temperature(self.temperature);

        let response = resolved
            .client
            .complete(&request)
            .await
            .map_err(|e| AppError::Expansion(e.to_string()))?;
        Ok(parse_keywords(&response.content))
    }
}

/// Split a comma-separated reply into trimmed, non-empty keywords.
pub fn parse_keywords(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}
