//! Receipt photo command

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cartwise_core::ai::{AIBackend, AIClient};
use cartwise_core::{SubstitutionEngine, UserPreferences};

use super::print_result;

/// Extract items from a receipt image with the configured vision backend, then analyze them
pub async fn cmd_receipt(
    engine: &SubstitutionEngine,
    image: &Path,
    preferences: &UserPreferences,
    json: bool,
) -> Result<()> {
    if !image.exists() {
        return Err(anyhow!("File not found: {}", image.display()));
    }

    let ai = AIClient::from_env().ok_or_else(|| {
        anyhow!("No AI backend configured. Set OPENAI_API_KEY, or AI_BACKEND=ollama with OLLAMA_HOST")
    })?;

    let image_data = std::fs::read(image).context("Failed to read receipt image")?;

    if !json {
        println!("🔍 Reading receipt with {} ({})...", ai.kind(), ai.model());
    }

    let receipt = ai
        .extract_items(&image_data, preferences)
        .await
        .context("Receipt extraction failed")?;

    if !json {
        println!("   Found {} item(s)", receipt.extracted_items.len());
    }

    let result = engine.analyze_values(&receipt.extracted_items, preferences);
    print_result(&result, json)
}
