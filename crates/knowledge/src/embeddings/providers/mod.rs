//! Concrete embedding backends.

pub mod gemini;
pub mod openai;
pub mod trigram;

pub use gemini::GeminiEmbeddings;
pub use openai::OpenAiEmbeddings;
pub use trigram::TrigramProvider;
