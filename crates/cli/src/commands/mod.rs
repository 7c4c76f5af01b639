//! Command handlers for the docchat CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod models;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use models::ModelsCommand;
pub use serve::ServeCommand;
