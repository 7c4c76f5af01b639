//! Shared, read-only state handed to every handler.

use crate::auth::{SessionVerifier, StaticTokenVerifier};
use docchat_core::config::Credentials;
use docchat_core::{AppConfig, AppResult};
use docchat_knowledge::RagPipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub verifier: Arc<dyn SessionVerifier>,
    /// Used to list selectable models
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(
        pipeline: RagPipeline,
        verifier: Arc<dyn SessionVerifier>,
        credentials: Credentials,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            verifier,
            credentials: Arc::new(credentials),
        }
    }

    /// Build the pipeline, provider clients and session gate from config.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let pipeline = RagPipeline::from_config(config)?;
        let verifier = Arc::new(StaticTokenVerifier::from_config(&config.auth));
        Ok(Self::new(pipeline, verifier, config.credentials.clone()))
    }
}
