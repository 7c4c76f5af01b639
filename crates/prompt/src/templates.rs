//! Built-in prompt templates.

/// Asks the model for search keywords related to a question.
pub const EXPANSION_TEMPLATE: &str = "Based on this user question, generate 3-5 relevant keywords for searching documents:
Question: {{question}}

Return only the keywords separated by commas, no other text.";

/// The grounded answer prompt.
pub const ANSWER_TEMPLATE: &str = "You are a helpful AI assistant that answers questions based on the user's documents.
Use the provided context to answer the user's question. If you reference specific information,
include the document title in your response using this format: {{citation_format}}.

Context:
{{context}}

Previous conversation:
{{history}}

Current question: {{question}}

Please provide a helpful and accurate response based on the context provided.";

const CITATION_PREFIX: &str = "[Source: ";
const CITATION_SUFFIX: &str = "]";

/// Bracketed citation marker for a document title, e.g. `[Source: Policy]`.
pub fn citation_marker(title: &str) -> String {
    format!("{}{}{}", CITATION_PREFIX, title, CITATION_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_marker() {
        assert_eq!(citation_marker("Policy"), "[Source: Policy]");
    }

    #[test]
    fn test_templates_reference_variables() {
        assert!(EXPANSION_TEMPLATE.contains("{{question}}"));
        for var in ["{{context}}", "{{history}}", "{{question}}", "{{citation_format}}"] {
            assert!(ANSWER_TEMPLATE.contains(var), "missing {}", var);
        }
    }
}
