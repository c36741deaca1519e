//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use cartwise_core::ai::AIBackend;

/// Health status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub catalog_entries: usize,
    pub ai_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_backend: Option<String>,
}

/// GET /api/health - Liveness plus catalog and AI configuration status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        catalog_entries: state.engine.catalog().len(),
        ai_configured: state.ai.is_some(),
        ai_backend: state
            .ai
            .as_ref()
            .map(|ai| format!("{} ({})", ai.kind(), ai.model())),
    })
}
