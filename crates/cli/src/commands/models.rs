//! Models command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_llm::list_models;

/// List models available with the configured credentials
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    /// Execute the models command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let models = list_models(&config.credentials);

        if self.json {
            let output = serde_json::json!({ "models": models });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if models.is_empty() {
            println!("No models available. Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY.");
            return Ok(());
        }

        for model in models {
            println!("{:<30} {:<20} {}", model.id, model.name, model.provider);
        }

        Ok(())
    }
}
