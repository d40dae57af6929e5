//! OpenAI-compatible provider (Chat Completions API)
//!
//! Works against any endpoint speaking `/v1/chat/completions`.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatProvider, ChatTurn, DEFAULT_TIMEOUT_SECS, GenerateRequest};
use crate::error::ProviderError;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    client: HttpClient,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// System message, then history, then the current user input
    fn build_messages(system: &str, history: &[ChatTurn], input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);

        if !system.is_empty() {
            messages.push(ChatMessage { role: "system".into(), content: system.to_string() });
        }

        messages.extend(history.iter().map(|turn| ChatMessage {
            role: turn.role.as_str().into(),
            content: turn.content.clone(),
        }));

        messages.push(ChatMessage { role: "user".into(), content: input.to_string() });

        messages
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ProviderError> {
        let api_request = ChatCompletionRequest {
            model: request.model.to_string(),
            messages: Self::build_messages(request.system, request.history, request.input),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&api_request)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ChatCompletionResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(ProviderError::Api { provider: PROVIDER, status, body });
        }

        let api_response: ChatCompletionResponse = response.json().await?;

        if let Some(error) = api_response.error {
            return Err(ProviderError::Remote { provider: PROVIDER, message: error.message });
        }

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::Empty { provider: PROVIDER })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}
