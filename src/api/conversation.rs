//! Conversation management endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiState};
use crate::conversation::DisplayMessage;
use crate::Error;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/conversation/{session_id}",
            get(get_history).delete(clear_history),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HistoryResponse {
    session_id: Uuid,
    messages: Vec<DisplayMessage>,
    message_count: usize,
}

#[derive(Deserialize)]
struct ClearQuery {
    /// Whether the pinned system messages survive the clear
    #[serde(default = "default_keep_system")]
    keep_system: bool,
}

const fn default_keep_system() -> bool {
    true
}

#[derive(Serialize)]
struct ClearResponse {
    session_id: Uuid,
    cleared: bool,
}

async fn get_history(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state
        .assistant
        .history(session_id)
        .await
        .ok_or(Error::SessionNotFound(session_id))?;

    Ok(Json(HistoryResponse {
        session_id,
        message_count: messages.len(),
        messages,
    }))
}

async fn clear_history(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>, ApiError> {
    let cleared = state.assistant.clear(session_id, query.keep_system).await;
    if !cleared {
        return Err(Error::SessionNotFound(session_id).into());
    }

    Ok(Json(ClearResponse {
        session_id,
        cleared,
    }))
}
