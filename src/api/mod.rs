//! HTTP surface
//!
//! Routes are grouped per concern: voice and text turns under `/api`,
//! conversation management under `/api`, and a bare `/health`. The
//! router is built separately from the server so tests can drive it
//! in-process with `tower::ServiceExt`.

pub mod conversation;
pub mod health;
pub mod voice;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::pipeline::VoiceAssistant;
use crate::Error;

/// Shared state behind every handler
pub struct ApiState {
    pub assistant: Arc<VoiceAssistant>,
    /// Transcription language when the request does not name one
    pub default_language: String,
}

/// Assemble the full application router
pub fn build_router(state: Arc<ApiState>) -> Router {
    let api = voice::router(Arc::clone(&state)).merge(conversation::router(Arc::clone(&state)));

    Router::new()
        .nest("/api", api)
        .merge(health::router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// HTTP server wrapping the router
pub struct ApiServer {
    state: Arc<ApiState>,
}

impl ApiServer {
    #[must_use]
    pub fn new(assistant: Arc<VoiceAssistant>, default_language: String) -> Self {
        Self {
            state: Arc::new(ApiState {
                assistant,
                default_language,
            }),
        }
    }

    /// Serve until ctrl-c, then release backend resources
    ///
    /// # Errors
    ///
    /// Fails when the listen address cannot be bound or the server loop
    /// errors out.
    pub async fn run(self, host: &str, port: u16) -> crate::Result<()> {
        let assistant = Arc::clone(&self.state.assistant);
        let router = build_router(self.state);

        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "gateway listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutdown signal received");
            })
            .await?;

        assistant.cleanup().await;
        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Error wrapper that maps domain failures onto HTTP responses
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            Error::InactiveConversation(_) => (StatusCode::CONFLICT, "conversation_inactive"),
            Error::Stt(_) => (StatusCode::BAD_GATEWAY, "stt_failed"),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_failed"),
            Error::Tts(_) => (StatusCode::BAD_GATEWAY, "tts_failed"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        let mut error = json!({
            "code": code,
            "message": self.0.to_string(),
        });
        if let Some(stage) = self.0.stage() {
            error["stage"] = json!(stage);
        }
        let body = Json(json!({ "error": error }));
        (status, body).into_response()
    }
}
