//! Prompt builder for rendering templates and injecting context.

use crate::templates::{citation_marker, ANSWER_TEMPLATE, EXPANSION_TEMPLATE};
use crate::types::{AnswerContext, BuiltPrompt, BuiltPromptMetadata, ContextDocument, HistoryLine};
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the keyword expansion prompt for a question.
pub fn build_expansion_prompt(question: &str) -> AppResult<String> {
    let mut variables = HashMap::new();
    variables.insert("question".to_string(), question.to_string());
    render_template(EXPANSION_TEMPLATE, &variables)
}

/// Assemble the answer prompt from retrieved documents, history, and the question.
///
/// Documents keep retrieval order and history keeps chronological order.
/// Nothing is truncated here; oversized prompts are rejected by the provider.
///
/// # Example
/// ```
/// use docchat_prompt::{build_answer_prompt, AnswerContext, ContextDocument};
///
/// let ctx = AnswerContext {
///     documents: vec![ContextDocument { title: "Policy", content: "Refunds within 30 days." }],
///     history: vec![],
///     question: "What is the refund policy?",
/// };
/// let built = build_answer_prompt(&ctx).unwrap();
/// assert!(built.text.contains("Document: Policy\nContent: Refunds within 30 days."));
/// ```
pub fn build_answer_prompt(ctx: &AnswerContext<'_>) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        documents = ctx.documents.len(),
        history = ctx.history.len(),
        "Building answer prompt"
    );

    let mut variables = HashMap::new();
    variables.insert("context".to_string(), render_documents(&ctx.documents));
    variables.insert("history".to_string(), render_history(&ctx.history));
    variables.insert("question".to_string(), ctx.question.to_string());
    variables.insert(
        "citation_format".to_string(),
        citation_marker("Document Title"),
    );

    let text = render_template(ANSWER_TEMPLATE, &variables)?;

    let metadata = BuiltPromptMetadata {
        document_count: ctx.documents.len(),
        history_turns: ctx.history.len(),
        prompt_bytes: text.len(),
    };

    Ok(BuiltPrompt { text, metadata })
}

/// Render documents as labeled blocks separated by blank lines.
pub fn render_documents(documents: &[ContextDocument<'_>]) -> String {
    documents
        .iter()
        .map(|doc| format!("Document: {}\nContent: {}", doc.title, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render history as `role: content` lines.
pub fn render_history(history: &[HistoryLine<'_>]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<ContextDocument<'static>> {
        vec![
            ContextDocument {
                title: "Policy",
                content: "Refunds within 30 days.",
            },
            ContextDocument {
                title: "Shipping",
                content: "Ships in 2 business days.",
            },
        ]
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "a < b & \"c\"".to_string());

        let result = render_template("{{question}}", &vars).unwrap();
        assert_eq!(result, "a < b & \"c\"");
    }

    #[test]
    fn test_render_documents_blocks() {
        let rendered = render_documents(&docs());
        assert_eq!(
            rendered,
            "Document: Policy\nContent: Refunds within 30 days.\n\nDocument: Shipping\nContent: Ships in 2 business days."
        );
    }

    #[test]
    fn test_render_documents_empty() {
        assert_eq!(render_documents(&[]), "");
    }

    #[test]
    fn test_render_history_lines() {
        let history = [
            HistoryLine {
                role: "user",
                content: "Hi",
            },
            HistoryLine {
                role: "assistant",
                content: "Hello! [Source: Policy]",
            },
        ];
        assert_eq!(
            render_history(&history),
            "user: Hi\nassistant: Hello! [Source: Policy]"
        );
    }

    #[test]
    fn test_build_answer_prompt_sections_in_order() {
        let ctx = AnswerContext {
            documents: docs(),
            history: vec![HistoryLine {
                role: "user",
                content: "earlier question",
            }],
            question: "What is the refund policy?",
        };

        let built = build_answer_prompt(&ctx).unwrap();
        let text = &built.text;

        let policy = text.find("Document: Policy").unwrap();
        let shipping = text.find("Document: Shipping").unwrap();
        let history = text.find("user: earlier question").unwrap();
        let question = text.find("Current question: What is the refund policy?").unwrap();

        assert!(policy < shipping);
        assert!(shipping < history);
        assert!(history < question);
        assert!(text.contains("[Source: Document Title]"));
        assert_eq!(built.metadata.document_count, 2);
        assert_eq!(built.metadata.history_turns, 1);
        assert_eq!(built.metadata.prompt_bytes, text.len());
    }

    #[test]
    fn test_build_answer_prompt_without_documents() {
        let ctx = AnswerContext {
            documents: vec![],
            history: vec![],
            question: "Anything?",
        };

        let built = build_answer_prompt(&ctx).unwrap();
        assert!(built.text.contains("Context:\n\n\nPrevious conversation:"));
        assert_eq!(built.metadata.document_count, 0);
    }

    #[test]
    fn test_build_expansion_prompt() {
        let prompt = build_expansion_prompt("What is the refund policy?").unwrap();
        assert!(prompt.contains("Question: What is the refund policy?"));
        assert!(prompt.contains("separated by commas"));
    }
}
