//! Model provider abstraction
//!
//! Providers are stateless: every call carries the system prompt and the
//! full conversation so far. Conversation state lives in [`crate::session`].
//!
//! - [`GeminiProvider`] - Gemini generateContent API
//! - [`OpenAiProvider`] - OpenAI-compatible Chat Completions API

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, ProviderError};

/// Default timeout for a model call
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Conversation Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Gemini calls this role "model"
    #[serde(alias = "model")]
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One exchanged message. Never modified after it joins a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Everything a provider needs for one completion.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    /// Prior turns, oldest first
    pub history: &'a [ChatTurn],
    /// The new user message
    pub input: &'a str,
}

// ============================================================================
// Provider Trait
// ============================================================================

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logging and status
    fn name(&self) -> &'static str;

    /// Run a single non-streaming completion and return the reply text
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ProviderError>;
}

// ============================================================================
// Provider Selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Build the provider for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    api_key: String,
    base_url: Option<String>,
    timeout: Duration,
) -> Arc<dyn ChatProvider> {
    match kind {
        ProviderKind::Gemini => {
            let mut provider = GeminiProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider) as Arc<dyn ChatProvider>
        }
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
    }
}
