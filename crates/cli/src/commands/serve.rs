//! Serve command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (overrides server.bindAddr)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        docchat_server::serve(config, shutdown_signal()).await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
