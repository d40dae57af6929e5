//! Error types shared by the session, providers and HTTP layer

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures raised by a model provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure. The URL is stripped so request secrets never surface.
    #[error("{0}")]
    Http(reqwest::Error),

    #[error("{provider} API error: {status} - {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} error: {message}")]
    Remote {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} response was blocked: {reason}")]
    Blocked {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned no candidates")]
    Empty { provider: &'static str },

    #[error("{0} is not set; the model provider is disabled")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.without_url())
    }
}

/// Request-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Client supplied an empty or absent message.
    #[error("No message provided.")]
    MissingInput,

    /// The model provider failed; carries the upstream message verbatim.
    #[error("{0}")]
    Upstream(String),

    /// A required provider key was absent at startup (lenient mode).
    #[error("{0} is not set; the model provider is disabled")]
    ConfigurationMissing(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MissingInput => StatusCode::BAD_REQUEST,
            ChatError::Upstream(_) | ChatError::ConfigurationMissing(_) | ChatError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(key) => ChatError::ConfigurationMissing(key),
            other => ChatError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Configuration problems detected while building the service.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown provider '{0}' (expected 'gemini' or 'openai')")]
    UnknownProvider(String),

    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("{0} is required but not set")]
    MissingKey(&'static str),
}
