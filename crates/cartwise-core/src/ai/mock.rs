//! Mock backend for testing
//!
//! Returns a fixed receipt for any image. Useful for unit tests and for
//! running the server without a vision model (`AI_BACKEND=mock`).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::UserPreferences;

use super::types::ExtractedReceipt;
use super::AIBackend;

/// Mock AI backend for testing
///
/// Returns predictable responses. Can be configured with custom items for
/// specific tests.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Items returned by every extraction
    pub items: Vec<Value>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            items: default_items(),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Return these items instead of the default receipt
    pub fn with_items(items: Vec<Value>) -> Self {
        Self {
            healthy: true,
            items,
        }
    }
}

fn default_items() -> Vec<Value> {
    vec![
        json!({"name": "Colgate Toothpaste", "price": 3.50, "quantity": "75ml", "category": "health"}),
        json!({"name": "Semi Skimmed Milk", "price": 1.65, "quantity": "2L", "category": "dairy"}),
        json!({"name": "White Bread", "price": 0.75, "quantity": "800g", "category": "bakery"}),
    ]
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn extract_items(
        &self,
        _image_data: &[u8],
        _preferences: &UserPreferences,
    ) -> Result<ExtractedReceipt> {
        Ok(ExtractedReceipt::new(self.items.clone()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_receipt() {
        let mock = MockBackend::new();
        let receipt = mock
            .extract_items(&[], &UserPreferences::default())
            .await
            .unwrap();
        assert_eq!(receipt.extracted_items.len(), 3);
        assert_eq!(receipt.extracted_items[0]["name"], "Colgate Toothpaste");
    }

    #[tokio::test]
    async fn test_mock_custom_items_and_health() {
        let mock = MockBackend::with_items(vec![json!({"name": "Eggs", "price": 2.1})]);
        let receipt = mock
            .extract_items(b"x", &UserPreferences::default())
            .await
            .unwrap();
        assert_eq!(receipt.extracted_items.len(), 1);
        assert!(mock.health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
        assert_eq!(mock.model(), "mock");
    }
}
