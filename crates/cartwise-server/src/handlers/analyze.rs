//! Receipt analysis and substitution handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{AppError, AppState};
use cartwise_core::ai::AIBackend;
use cartwise_core::{AnalysisResult, Error, UserPreferences};

/// Request body for receipt analysis
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReceiptRequest {
    /// JPEG image, base64 encoded; a `data:` URL prefix is accepted
    pub image_base64: Option<String>,
    pub preferences: Option<UserPreferences>,
}

/// Request body for substitutions over caller-supplied items
#[derive(Debug, Deserialize)]
pub struct SubstitutionsRequest {
    pub items: Option<Vec<Value>>,
    pub preferences: Option<UserPreferences>,
}

/// POST /api/analyze-receipt - Extract items from a receipt image and find cheaper alternatives
pub async fn analyze_receipt(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeReceiptRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let Json(request) = body.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let image = request
        .image_base64
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing imageBase64 in request body"))?;
    let preferences = request
        .preferences
        .ok_or_else(|| AppError::bad_request("Missing preferences in request body"))?;

    let image_data = decode_image(&image)?;

    let ai = state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::internal("API not configured"))?;

    info!(
        "Analyzing receipt ({} bytes) with {} (model: {})",
        image_data.len(),
        ai.kind(),
        ai.model()
    );

    let receipt = ai
        .extract_items(&image_data, &preferences)
        .await
        .map_err(extraction_error)?;

    let result = state
        .engine
        .analyze_values(&receipt.extracted_items, &preferences);

    info!(
        "Receipt analyzed: {} items extracted, {} substitutions, {:.2} saved",
        receipt.extracted_items.len(),
        result.substitutions.len(),
        result.total_savings
    );

    Ok(Json(result))
}

/// POST /api/substitutions - Find cheaper alternatives for already-extracted items
pub async fn find_substitutions(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubstitutionsRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let Json(request) = body.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let items = request
        .items
        .ok_or_else(|| AppError::bad_request("Missing items in request body"))?;
    let preferences = request.preferences.unwrap_or_default();

    Ok(Json(state.engine.analyze_values(&items, &preferences)))
}

/// Decode the receipt image, tolerating a data URL prefix and line breaks
fn decode_image(encoded: &str) -> Result<Vec<u8>, AppError> {
    let payload = match encoded.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| {
            warn!("Rejected receipt image: {}", e);
            AppError::bad_request("Invalid base64 image data")
        })
}

/// Map an extraction failure onto the client-facing status and message
fn extraction_error(err: Error) -> AppError {
    match err {
        Error::Api { status: 401, .. } => {
            warn!("Vision API rejected credentials");
            AppError::new(StatusCode::UNAUTHORIZED, "Invalid API key")
        }
        Error::Api { status: 429, .. } => {
            warn!("Vision API rate limit hit");
            AppError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.",
            )
        }
        Error::AiResponse(_) | Error::Json(_) => {
            error!("Failed to parse AI response: {}", err);
            AppError::internal("Failed to parse AI response")
        }
        other => {
            error!("Receipt analysis failed: {}", other);
            AppError::internal("An error occurred while analyzing the receipt")
                .with_details(other.to_string())
        }
    }
}
