//! Prompt types for docchat.
//!
//! Inputs are borrowed views so callers can render straight from their own
//! document and history types without cloning content.

use serde::{Deserialize, Serialize};

/// A retrieved document as it appears in the context block.
#[derive(Debug, Clone, Copy)]
pub struct ContextDocument<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// One prior conversation turn.
#[derive(Debug, Clone, Copy)]
pub struct HistoryLine<'a> {
    /// "user" or "assistant"
    pub role: &'a str,
    pub content: &'a str,
}

/// Everything the answer prompt is assembled from.
#[derive(Debug, Clone)]
pub struct AnswerContext<'a> {
    /// Retrieved documents in retrieval order
    pub documents: Vec<ContextDocument<'a>>,

    /// Conversation history in chronological order
    pub history: Vec<HistoryLine<'a>>,

    /// The question being answered
    pub question: &'a str,
}

/// A rendered prompt ready for the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Full prompt text
    pub text: String,

    /// Metadata about what went into the prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a rendered prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPromptMetadata {
    /// Number of documents rendered into the context block
    pub document_count: usize,

    /// Number of history turns rendered
    pub history_turns: usize,

    /// Length of the rendered prompt in bytes
    pub prompt_bytes: usize,
}
