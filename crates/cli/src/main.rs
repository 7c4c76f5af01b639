//! docchat CLI
//!
//! Main entry point for the docchat command-line tool.
//! Serves the chat API or answers questions over local documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ModelsCommand, ServeCommand};
use docchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docchat - streaming question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Streaming question answering over your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Ask a question about a set of documents
    Ask(AskCommand),

    /// List models available with the configured credentials
    Models(ModelsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load defaults, config file and environment
    let config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    let bind_addr = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };
    let config = config.with_overrides(bind_addr, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docchat starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Credentials: {:?}", config.credentials);

    config.validate()?;

    // Emit command span
    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Models(_) => "models",
    };
    let span = tracing::info_span!("command", name = command_name);
    let _enter = span.enter();

    // Route to command handlers
    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Models(cmd) => cmd.execute(&config),
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
