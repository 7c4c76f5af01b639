//! Request-scoped data model for the answering pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A previously extracted document supplied with a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique within one request's document set
    pub id: String,

    /// Title, also used as the citation label
    pub title: String,

    /// Extracted plain text
    pub content: String,

    /// Link back to the original document
    pub url: String,

    pub last_modified: DateTime<Utc>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,

    /// Citation labels attached to an earlier answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// Inbound chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's question
    pub message: String,

    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,

    /// Requested generation model identifier
    pub model: String,

    /// Documents to answer from
    #[serde(default)]
    pub indexed_docs: Vec<Document>,
}

/// A document returned by one similarity query.
#[derive(Debug, Clone)]
pub struct RetrievedMatch {
    pub document: Arc<Document>,

    /// Cosine similarity to the query (higher is closer)
    pub score: f32,
}

/// Incremental answer text plus the answer's citation labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerDelta {
    pub content: String,

    /// Complete source list; omitted entirely when nothing was retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

/// One event of an answer stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(AnswerDelta),
    /// Terminal sentinel marking normal completion
    Done,
}

impl StreamEvent {
    pub fn delta(content: impl Into<String>, sources: Option<Vec<String>>) -> Self {
        StreamEvent::Delta(AnswerDelta {
            content: content.into(),
            sources,
        })
    }

    /// Text carried by this event, empty for the sentinel.
    pub fn content(&self) -> &str {
        match self {
            StreamEvent::Delta(delta) => &delta.content,
            StreamEvent::Done => "",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }
}
