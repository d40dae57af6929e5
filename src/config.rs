//! Configuration
//!
//! Resolution order: CLI flag > environment variable (via clap) >
//! `~/.recipe-chat/config.toml` > built-in default.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::provider::{self, ChatProvider, DEFAULT_TIMEOUT_SECS, ProviderKind};

/// System prompt used when a request does not bring its own
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Name of the variable holding the model provider key
pub const API_KEY_VAR: &str = "API_KEY";

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug, Default)]
#[command(name = "recipe-chat")]
#[command(about = "Chat proxy with recipe-aware YouTube lookup", version)]
pub struct CliArgs {
    /// Model provider: gemini or openai
    #[arg(long, env = "PROVIDER")]
    pub provider: Option<String>,

    /// Model provider API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name (defaults per provider)
    #[arg(long, env = "MODEL_NAME")]
    pub model_name: Option<String>,

    /// YouTube Data API key; video lookup is disabled without it
    #[arg(long, env = "SEARCH_API_KEY", hide_env_values = true)]
    pub search_api_key: Option<String>,

    /// Override the provider base URL (proxies, compatible endpoints)
    #[arg(long, env = "PROVIDER_BASE_URL")]
    pub base_url: Option<String>,

    /// Bind address
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Bind port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Refuse to start without an API key instead of failing per request
    #[arg(long, env = "REQUIRE_API_KEY")]
    pub require_api_key: bool,

    /// Model call timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Config file path (default: ~/.recipe-chat/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Config File
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub search_api_key: Option<String>,
    pub base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub require_api_key: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    /// Replaces the built-in default system prompt
    pub system_prompt: Option<String>,
}

impl FileConfig {
    /// Load from the default location
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Missing or unreadable files fall back to defaults with a warning
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".recipe-chat")
        .join("config.toml")
}

// ============================================================================
// Resolved Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model_name: String,
    pub search_api_key: Option<String>,
    pub base_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub require_api_key: bool,
    pub request_timeout: Duration,
    pub system_prompt: String,
}

impl AppConfig {
    /// Merge CLI/env values over the config file and validate the result
    pub fn resolve(args: CliArgs, file: FileConfig) -> Result<Self, ConfigError> {
        let provider = match args.provider.or(file.provider) {
            Some(name) => name.parse()?,
            None => ProviderKind::default(),
        };

        let model_name = args
            .model_name
            .or(file.model_name)
            .unwrap_or_else(|| provider.default_model().to_string());

        let config = Self {
            provider,
            api_key: non_blank(args.api_key.or(file.api_key)),
            model_name,
            search_api_key: non_blank(args.search_api_key.or(file.search_api_key)),
            base_url: non_blank(args.base_url.or(file.base_url)),
            host: args.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            require_api_key: args.require_api_key || file.require_api_key.unwrap_or(false),
            request_timeout: Duration::from_secs(
                args.request_timeout_secs
                    .or(file.request_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            system_prompt: file
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::Blank("model name"));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(ConfigError::Blank("system prompt"));
        }
        if self.require_api_key && self.api_key.is_none() {
            return Err(ConfigError::MissingKey(API_KEY_VAR));
        }
        Ok(())
    }

    /// `None` when no key is configured; requests then fail individually.
    pub fn build_provider(&self) -> Option<Arc<dyn ChatProvider>> {
        self.api_key.clone().map(|key| {
            provider::build_provider(self.provider, key, self.base_url.clone(), self.request_timeout)
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
