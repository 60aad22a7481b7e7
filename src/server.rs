//! HTTP surface of the bridge.
//!
//! Every chat-level failure is already folded into a 200 reply by
//! [`ChatBridge`]; only malformed JSON is rejected by axum itself.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value as JsonValue;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::bridge::ChatBridge;
use crate::client::GenerativeModel;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::types::{AnalyzeImageReply, AnalyzeImageRequest, ChatReply, ChatRequest, ClearReply};

/// Shared state handed to every handler.
pub struct AppState<M: GenerativeModel> {
    bridge: Arc<ChatBridge<M>>,
}

impl<M: GenerativeModel> AppState<M> {
    /// Wrap a bridge for sharing across handlers.
    pub fn new(bridge: ChatBridge<M>) -> Self {
        Self {
            bridge: Arc::new(bridge),
        }
    }

    /// The bridge behind this state.
    pub fn bridge(&self) -> &ChatBridge<M> {
        &self.bridge
    }
}

impl<M: GenerativeModel> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
        }
    }
}

/// Build the application router.
pub fn router<M: GenerativeModel + 'static>(state: AppState<M>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::<M>))
        .route("/api/clear", post(clear::<M>))
        .route("/api/analyze-image", post(analyze_image::<M>))
        .fallback_service(ServeDir::new(&config.public_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process exits.
pub async fn serve<M: GenerativeModel + 'static>(
    state: AppState<M>,
    config: &ServerConfig,
) -> Result<()> {
    let app = router(state, config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| Error::io(format!("failed to bind {}", config.addr), e))?;
    tracing::info!(addr = %config.addr, public_dir = %config.public_dir.display(), "starting geminichat-server");
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::io("server error", e))
}

async fn health() -> Json<JsonValue> {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn chat<M: GenerativeModel>(
    State(state): State<AppState<M>>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(state.bridge.chat(req).await)
}

async fn clear<M: GenerativeModel>(State(state): State<AppState<M>>) -> Json<ClearReply> {
    Json(state.bridge.clear_history().await)
}

async fn analyze_image<M: GenerativeModel>(
    State(state): State<AppState<M>>,
    Json(req): Json<AnalyzeImageRequest>,
) -> Json<AnalyzeImageReply> {
    Json(state.bridge.analyze_image(req).await)
}
