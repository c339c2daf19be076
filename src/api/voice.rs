//! Voice and text turn endpoints

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ApiState};
use crate::pipeline::TextTurn;
use crate::Error;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/voice/process", post(process_voice))
        .route("/text/process", post(process_text))
        .with_state(state)
}

#[derive(Deserialize)]
struct VoiceQuery {
    session_id: Option<Uuid>,
    language: Option<String>,
}

#[derive(Deserialize)]
struct TextRequest {
    text: String,
    session_id: Option<Uuid>,
}

/// Full pipeline turn: audio in, audio out
///
/// Text products of the turn travel in response headers (base64 for the
/// free-form ones) so the body can stay raw WAV.
async fn process_voice(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<VoiceQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let language = query
        .language
        .as_deref()
        .unwrap_or(&state.default_language);

    let turn = state
        .assistant
        .process_voice(&body, query.session_id, language)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("audio/wav"),
    );
    insert_header(&mut headers, "x-session-id", &turn.session_id.to_string())?;
    insert_header(
        &mut headers,
        "x-transcribed-text",
        &BASE64.encode(&turn.transcribed_text),
    )?;
    insert_header(
        &mut headers,
        "x-response-text",
        &BASE64.encode(&turn.response_text),
    )?;
    insert_header(
        &mut headers,
        "x-latency-total",
        &format!("{:.3}", turn.timings.total),
    )?;
    if let Some(secs) = turn.timings.stt {
        insert_header(&mut headers, "x-latency-stt", &format!("{secs:.3}"))?;
    }
    if let Some(secs) = turn.timings.llm {
        insert_header(&mut headers, "x-latency-llm", &format!("{secs:.3}"))?;
    }
    if let Some(secs) = turn.timings.tts {
        insert_header(&mut headers, "x-latency-tts", &format!("{secs:.3}"))?;
    }

    Ok((headers, turn.response_audio))
}

/// Text turn for exercising the model path; audio stays server-side
async fn process_text(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TextRequest>,
) -> Result<Json<TextTurn>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(Error::Validation("text must not be empty".into()).into());
    }

    let turn = state
        .assistant
        .process_text(&request.text, request.session_id)
        .await?;
    Ok(Json(turn))
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::Validation(format!("invalid header value for {name}: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
