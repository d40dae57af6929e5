//! HTTP server
//!
//! - POST /message - Send a chat message, get the reply (+ video for recipes)
//! - POST /reset   - Forget the conversation
//! - GET  /status  - Health check

pub mod handlers;
pub mod types;

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, DEFAULT_SYSTEM_PROMPT};
use crate::provider::ChatProvider;
use crate::session::{SharedSession, shared_session};
use crate::video::{VideoSearch, YouTubeClient};

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    /// `None` when no API key was configured; /message then fails per request
    pub provider: Option<Arc<dyn ChatProvider>>,
    pub videos: Arc<dyn VideoSearch>,
    pub model_name: String,
    pub default_system_prompt: String,
}

impl AppState {
    pub fn new(
        provider: Option<Arc<dyn ChatProvider>>,
        videos: Arc<dyn VideoSearch>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            session: shared_session(),
            provider,
            videos,
            model_name: model_name.into(),
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_system_prompt = prompt.into();
        self
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let videos = YouTubeClient::new(config.search_api_key.clone());
        Self::new(config.build_provider(), Arc::new(videos), config.model_name.clone())
            .with_system_prompt(config.system_prompt.clone())
    }
}

// ============================================================================
// Routes
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/message", post(handlers::message_handler))
        .route("/reset", post(handlers::reset_handler))
        .route("/status", get(handlers::status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: AppConfig) -> Result<()> {
    let state = AppState::from_config(&config);

    match &state.provider {
        Some(provider) => info!(provider = provider.name(), model = %config.model_name, "Model provider ready"),
        None => tracing::warn!(
            "{} is not set; /message will fail until it is configured",
            crate::config::API_KEY_VAR
        ),
    }
    info!(
        "Video lookup: {}",
        if state.videos.is_enabled() { "enabled" } else { "disabled (no SEARCH_API_KEY)" }
    );

    let app = create_router(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
