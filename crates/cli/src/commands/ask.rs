//! Ask command handler.
//!
//! Runs the answering pipeline in-process over documents read from a JSON
//! file and prints the answer as it streams.

use anyhow::Context;
use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{ChatRequest, Document, RagPipeline, StreamEvent};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Ask a question about a set of documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// JSON file holding an array of documents
    #[arg(short, long)]
    pub docs: Option<PathBuf>,

    /// Generation model identifier
    #[arg(short, long, default_value = "gemini-1.5-flash")]
    pub model: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let documents = match &self.docs {
            Some(path) => load_documents(path).map_err(|e| AppError::Config(format!("{:#}", e)))?,
            None => Vec::new(),
        };
        tracing::debug!("Loaded {} documents", documents.len());

        let pipeline = RagPipeline::from_config(config)?;
        let request = ChatRequest {
            message: self.question.clone(),
            history: Vec::new(),
            model: self.model.clone(),
            indexed_docs: documents,
        };

        let mut answer = pipeline.answer(request).await?;
        let sources: Vec<String> = answer.sources().map(<[String]>::to_vec).unwrap_or_default();
        let mut full_content = String::new();

        while let Some(event) = answer.next().await {
            match event? {
                StreamEvent::Delta(delta) => {
                    if !self.json {
                        // Stream to stdout in real-time
                        print!("{}", delta.content);
                        std::io::stdout().flush().ok();
                    }
                    full_content.push_str(&delta.content);
                }
                StreamEvent::Done => break,
            }
        }

        if self.json {
            let output = serde_json::json!({
                "answer": full_content,
                "model": self.model,
                "sources": sources,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!();
            if !sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &sources {
                    println!("  - {}", source);
                }
            }
        }

        Ok(())
    }
}

/// Read a JSON array of documents.
fn load_documents(path: &Path) -> anyhow::Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents file {}", path.display()))?;
    let documents = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid documents file {}", path.display()))?;
    Ok(documents)
}
