//! Configuration management for docchat.
//!
//! This module loads and merges configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`docchat.yaml`, or the path in `DOCCHAT_CONFIG`)
//! - Environment variables (provider API keys, bind address, auth tokens)
//! - Command-line flags
//!
//! Provider credentials are resolved once here and handed to the pipeline
//! as plain values; nothing downstream reads the process environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docchat.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Provider endpoints and key sources
    pub providers: ProvidersConfig,

    /// Resolved provider credentials
    #[serde(skip)]
    pub credentials: Credentials,

    /// Answering pipeline tuning
    pub rag: RagConfig,

    /// Session gate settings
    pub auth: AuthConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Where a provider's API key comes from and which endpoint it talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Custom API base URL (defaults to the vendor endpoint)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderSettings {
    fn with_env(api_key_env: &str) -> Self {
        Self {
            api_key_env: api_key_env.to_string(),
            endpoint: None,
        }
    }
}

/// Provider configuration for all supported vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,

    /// Per-call HTTP timeout for provider requests, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderSettings::with_env("OPENAI_API_KEY"),
            anthropic: ProviderSettings::with_env("ANTHROPIC_API_KEY"),
            gemini: ProviderSettings::with_env("GEMINI_API_KEY"),
            request_timeout_secs: 120,
        }
    }
}

/// Resolved provider API keys.
///
/// `Debug` never prints key material.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
}

impl Credentials {
    /// Resolve keys from the environment variables named in `providers`.
    pub fn from_env(providers: &ProvidersConfig) -> Self {
        Self {
            openai: read_key(&providers.openai.api_key_env),
            anthropic: read_key(&providers.anthropic.api_key_env),
            gemini: read_key(&providers.gemini.api_key_env),
        }
    }

    /// True when at least one provider key is configured.
    pub fn any(&self) -> bool {
        self.openai.is_some() || self.anthropic.is_some() || self.gemini.is_some()
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("openai", &mask(&self.openai))
            .field("anthropic", &mask(&self.anthropic))
            .field("gemini", &mask(&self.gemini))
            .finish()
    }
}

/// Tuning for the answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RagConfig {
    /// Documents embedded concurrently while building the index
    pub embed_concurrency: usize,

    /// Retrieval queries embedded concurrently
    pub query_concurrency: usize,

    /// Capacity of the answer event channel
    pub stream_buffer: usize,

    /// Model used for keyword expansion
    pub expansion_model: String,

    /// Sampling temperature for generation calls
    pub temperature: f32,

    /// Allow the offline trigram embedder when no provider key is set
    pub local_embeddings: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embed_concurrency: 8,
            query_concurrency: 4,
            stream_buffer: 16,
            expansion_model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            local_embeddings: false,
        }
    }
}

/// Session gate settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// Accepted bearer tokens
    pub tokens: Vec<String>,

    /// Authorize every request (local development only)
    pub disabled: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: Option<ServerConfig>,
    providers: Option<ProvidersConfig>,
    rag: Option<RagConfig>,
    auth: Option<AuthConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            credentials: Credentials::default(),
            rag: RagConfig::default(),
            auth: AuthConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and environment variables.
    ///
    /// Environment variables:
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_BIND`: Server bind address
    /// - `DOCCHAT_AUTH_TOKENS`: Comma-separated bearer tokens
    /// - `DOCCHAT_AUTH_DISABLED`: Authorize all requests when set to `1`/`true`
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY` (or the
    ///   variables named by `providers.*.apiKeyEnv`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Listening on {}", config.server.bind_addr);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(bind) = std::env::var("DOCCHAT_BIND") {
            config.server.bind_addr = bind;
        }

        if let Ok(tokens) = std::env::var("DOCCHAT_AUTH_TOKENS") {
            config.auth.tokens = parse_token_list(&tokens);
        }

        if let Ok(disabled) = std::env::var("DOCCHAT_AUTH_DISABLED") {
            config.auth.disabled = matches!(disabled.as_str(), "1" | "true" | "yes");
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.credentials = Credentials::from_env(&config.providers);

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(providers) = config_file.providers {
            result.providers = providers;
        }

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        if let Some(auth) = config_file.auth {
            result.auth = auth;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        bind_addr: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.server.bind_addr = bind_addr;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate pipeline tuning values.
    pub fn validate(&self) -> AppResult<()> {
        if self.rag.embed_concurrency == 0 {
            return Err(AppError::Config(
                "rag.embedConcurrency must be at least 1".to_string(),
            ));
        }

        if self.rag.query_concurrency == 0 {
            return Err(AppError::Config(
                "rag.queryConcurrency must be at least 1".to_string(),
            ));
        }

        if self.rag.stream_buffer == 0 {
            return Err(AppError::Config(
                "rag.streamBuffer must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.rag.temperature) {
            return Err(AppError::Config(format!(
                "rag.temperature must be within 0.0-2.0, got {}",
                self.rag.temperature
            )));
        }

        if self.rag.expansion_model.trim().is_empty() {
            return Err(AppError::Config(
                "rag.expansionModel must not be empty".to_string(),
            ));
        }

        if !self.auth.disabled && self.auth.tokens.is_empty() {
            tracing::warn!("No auth tokens configured; every request will be rejected");
        }

        Ok(())
    }
}

fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
