//! HTTP handlers for chat, reset and status

use axum::{Json, body::Bytes, extract::State};
use tracing::{debug, error, info};

use super::AppState;
use super::types::{MessageRequest, MessageResponse, RESET_STATUS, ResetResponse, StatusResponse};
use crate::classifier;
use crate::config::API_KEY_VAR;
use crate::error::ChatError;
use crate::session::{SessionConfig, history_from_json};

/// Results requested from the video search
const VIDEO_MAX_RESULTS: u32 = 1;

/// `POST /message`
pub async fn message_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ChatError> {
    let request = MessageRequest::from_body(&body);
    let text = request.text();
    if text.is_empty() {
        return Err(ChatError::MissingInput);
    }

    let Some(provider) = state.provider.as_deref() else {
        error!("Message received but {} is not configured", API_KEY_VAR);
        return Err(ChatError::ConfigurationMissing(API_KEY_VAR));
    };

    let system = request
        .system
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(state.default_system_prompt.as_str());
    let config = SessionConfig::new(state.model_name.as_str(), system)?
        .with_history(history_from_json(request.history.as_ref()));

    let reply = {
        let mut session = state.session.lock().await;
        session.send(provider, text, config).await?
    };

    let signals = classifier::classify(&reply);
    debug!(?signals, "Classified reply");

    let youtube = if signals.is_recipe() {
        let query = format!("{} recipe", text);
        state.videos.find_top_video(&query, VIDEO_MAX_RESULTS).await
    } else {
        None
    };

    Ok(Json(MessageResponse { reply, youtube }))
}

/// `POST /reset`
pub async fn reset_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    state.session.lock().await.reset();
    info!("Chat reset requested");
    Json(ResetResponse { status: RESET_STATUS.to_string() })
}

/// `GET /status`
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    // Don't wait behind an in-flight model call
    let session = match state.session.try_lock() {
        Ok(session) if session.is_active() => "active",
        Ok(_) => "uninitialized",
        Err(_) => "busy",
    };

    Json(StatusResponse {
        status: "ok".to_string(),
        provider: state.provider.as_ref().map(|p| p.name().to_string()),
        model: state.model_name.clone(),
        video_lookup: state.videos.is_enabled(),
        session: session.to_string(),
    })
}
