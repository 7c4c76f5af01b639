//! Retrieval-augmented answering.
//!
//! A request flows through [`RagPipeline`]: its documents are embedded into
//! an ephemeral index, the question is expanded into keywords, the question
//! and keywords are run against the index, and the retained documents are
//! rendered into a prompt whose completion is streamed back.

pub mod expand;
pub mod generator;
pub mod pipeline;
pub mod retriever;

pub use expand::{parse_keywords, QueryExpander};
pub use generator::{AnswerStream, GenerationState, Generator};
pub use pipeline::{PreparedAnswer, RagPipeline};
pub use retriever::{merge_matches, Retrieval, Retriever, MAX_CONTEXT_DOCUMENTS, PER_QUERY_K};
