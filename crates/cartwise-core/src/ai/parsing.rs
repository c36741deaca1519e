//! JSON parsing helpers for AI backend responses
//!
//! These functions extract JSON from AI model responses, which often include
//! extra text (or Markdown fences) before/after the JSON payload.

use crate::error::{Error, Result};

use super::types::ExtractedReceipt;

/// Longest slice of a raw response quoted back in error messages
const RAW_PREVIEW_CHARS: usize = 200;

/// Parse the item list from a vision model response
///
/// A JSON object without `extractedItems` is an empty receipt; text with no
/// JSON object in it is an error.
pub fn parse_extraction_response(response: &str) -> Result<ExtractedReceipt> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::AiResponse(format!(
                    "Invalid JSON from AI: {} | Raw: {}",
                    e,
                    preview(json_str)
                ))
            })
        }
        _ => Err(Error::AiResponse(format!(
            "No JSON found in AI response | Raw: {}",
            preview(response)
        ))),
    }
}

// Truncate on a char boundary
fn preview(text: &str) -> String {
    match text.char_indices().nth(RAW_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
