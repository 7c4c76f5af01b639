//! Prompt system for docchat.
//!
//! This crate renders the two prompts the answering pipeline sends to a model:
//! - the keyword expansion prompt
//! - the grounded answer prompt (retrieved documents, history, question,
//!   and the citation instruction)
//!
//! Templates are Handlebars with HTML escaping disabled.

pub mod builder;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::{build_answer_prompt, build_expansion_prompt, render_documents, render_history};
pub use templates::citation_marker;
pub use types::{AnswerContext, BuiltPrompt, BuiltPromptMetadata, ContextDocument, HistoryLine};
