//! Liveness endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::ApiState;
use crate::pipeline::HealthReport;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    components: HealthReport,
}

/// Probes every backend; 503 when a critical stage is down
async fn health(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<HealthResponse>) {
    let components = state.assistant.health_check().await;
    let (status_code, status) = if components.overall {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            components,
        }),
    )
}
