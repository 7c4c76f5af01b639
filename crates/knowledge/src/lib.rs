//! Request-scoped document question answering.
//!
//! Each chat request brings its own documents. They are embedded into an
//! in-memory index that lives only as long as the request, searched with
//! the question plus model-generated keywords, and the best matches are
//! handed to a generation model whose answer is streamed back with
//! citations.

pub mod embeddings;
pub mod index;
pub mod rag;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{resolve_embedder, EmbeddingProvider};
pub use index::EphemeralIndex;
pub use rag::{AnswerStream, GenerationState, PreparedAnswer, RagPipeline};
pub use types::{AnswerDelta, ChatRequest, ConversationTurn, Document, Role, StreamEvent};
