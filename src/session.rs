//! Server-side conversation state
//!
//! One conversation per process. The system prompt and initial history are
//! captured on the first message and stay fixed until [`ConversationSession::reset`].
//! Later messages only append turns; any system prompt or history they carry
//! is ignored.
//!
//! ```text
//!   Uninitialized --send--> Active --send--> Active
//!         ^                   |
//!         +------reset--------+
//! ```

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{ChatError, ConfigError};
use crate::provider::{ChatProvider, ChatTurn, GenerateRequest};

/// Handle to the process-wide session. The lock is held for a whole `send`.
pub type SharedSession = Arc<Mutex<ConversationSession>>;

pub fn shared_session() -> SharedSession {
    Arc::new(Mutex::new(ConversationSession::new()))
}

// ============================================================================
// Session Config
// ============================================================================

/// Settings that seed a fresh conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    model_name: String,
    system_prompt: String,
    initial_history: Vec<ChatTurn>,
}

impl SessionConfig {
    pub fn new(
        model_name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let model_name = model_name.into();
        let system_prompt = system_prompt.into();

        if model_name.trim().is_empty() {
            return Err(ConfigError::Blank("model name"));
        }
        if system_prompt.trim().is_empty() {
            return Err(ConfigError::Blank("system prompt"));
        }

        Ok(Self { model_name, system_prompt, initial_history: Vec::new() })
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.initial_history = history;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Parse client-supplied history. Anything but a well-formed array of
/// `{role, content}` objects yields an empty history.
pub fn history_from_json(value: Option<&Value>) -> Vec<ChatTurn> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Vec::new();
    };

    if !value.is_array() {
        debug!("Ignoring non-array history");
        return Vec::new();
    }

    match serde_json::from_value::<Vec<ChatTurn>>(value.clone()) {
        Ok(turns) => turns,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed history");
            Vec::new()
        }
    }
}

// ============================================================================
// Conversation Session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
}

#[derive(Debug)]
struct ActiveContext {
    model_name: String,
    system_prompt: String,
    history: Vec<ChatTurn>,
}

impl From<SessionConfig> for ActiveContext {
    fn from(config: SessionConfig) -> Self {
        Self {
            model_name: config.model_name,
            system_prompt: config.system_prompt,
            history: config.initial_history,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConversationSession {
    context: Option<ActiveContext>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match self.context {
            Some(_) => SessionState::Active,
            None => SessionState::Uninitialized,
        }
    }

    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    /// Turns recorded so far, oldest first. Empty when uninitialized.
    pub fn history(&self) -> &[ChatTurn] {
        self.context.as_ref().map(|c| c.history.as_slice()).unwrap_or(&[])
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.system_prompt.as_str())
    }

    /// Send `text` and return the trimmed reply.
    ///
    /// `config` seeds the conversation only when the session is uninitialized.
    /// A failed call appends nothing; if it was the first call, the session
    /// drops back to uninitialized so the next request can seed it again.
    pub async fn send(
        &mut self,
        provider: &dyn ChatProvider,
        text: &str,
        config: SessionConfig,
    ) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::MissingInput);
        }

        let fresh = self.context.is_none();
        let ctx = self.context.get_or_insert_with(|| {
            info!(
                model = %config.model_name,
                history_len = config.initial_history.len(),
                "Starting new conversation"
            );
            ActiveContext::from(config)
        });

        let result = provider
            .generate(GenerateRequest {
                model: &ctx.model_name,
                system: &ctx.system_prompt,
                history: &ctx.history,
                input: text,
            })
            .await;

        match result {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                ctx.history.push(ChatTurn::user(text));
                ctx.history.push(ChatTurn::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                error!(provider = provider.name(), error = %e, "Model call failed");
                if fresh {
                    self.context = None;
                }
                Err(e.into())
            }
        }
    }

    /// Forget the conversation. No-op when already uninitialized.
    pub fn reset(&mut self) {
        if let Some(ctx) = self.context.take() {
            info!(turns = ctx.history.len(), "Conversation reset");
        }
    }
}
