//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Items read off a receipt image by a vision model
///
/// Items are kept as raw JSON: models return loosely-typed records (string
/// prices, numeric quantities, missing fields) and validation happens when
/// the engine converts them into purchased items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedReceipt {
    #[serde(default, deserialize_with = "items_or_empty")]
    pub extracted_items: Vec<Value>,
}

impl ExtractedReceipt {
    pub fn new(extracted_items: Vec<Value>) -> Self {
        Self { extracted_items }
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_items.is_empty()
    }
}

// `null` or a non-array means "no items", not a parse failure
fn items_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}
