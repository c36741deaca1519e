//! Item file analysis command

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cartwise_core::{ExtractedReceipt, SubstitutionEngine, UserPreferences};
use serde_json::Value;

use super::print_result;

/// Find substitutions for the items listed in a JSON file
pub fn cmd_analyze(
    engine: &SubstitutionEngine,
    items_path: &Path,
    preferences: &UserPreferences,
    json: bool,
) -> Result<()> {
    let items = load_items(items_path)?;
    let result = engine.analyze_values(&items, preferences);
    print_result(&result, json)
}

/// Read items from a JSON array or a `{"extractedItems": [...]}` document
pub fn load_items(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    if value.get("extractedItems").is_some() {
        let receipt: ExtractedReceipt = serde_json::from_value(value)?;
        return Ok(receipt.extracted_items);
    }

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(anyhow!(
            "Expected a JSON array of items or an object with \"extractedItems\""
        )),
    }
}
