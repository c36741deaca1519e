//! Pluggable vision backend abstraction
//!
//! Turns a receipt photo into raw purchased-item records. The engine never
//! talks to a model directly; it only sees the `ExtractedReceipt` these
//! backends return.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all vision backends
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `OllamaBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env();
//!
//! if let Some(ref client) = ai {
//!     let receipt = client.extract_items(&image_bytes, &preferences).await?;
//!     let result = engine.analyze_values(&receipt.extracted_items, &preferences);
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, ollama, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (default: https://api.openai.com)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o)
//! - `OPENAI_COMPATIBLE_API_KEY` or `OPENAI_API_KEY`: API key
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Vision model name (default: llama3.2-vision)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::parse_extraction_response;
pub use types::*;

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::UserPreferences;
use crate::prompts::{preference_vars, PromptId, PromptLibrary};

/// Trait defining the interface for all vision backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Read the purchased items off a receipt image
    ///
    /// Preferences are passed to the model as context only; filtering is the
    /// engine's job.
    async fn extract_items(
        &self,
        image_data: &[u8],
        preferences: &UserPreferences,
    ) -> Result<ExtractedReceipt>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// OpenAI-compatible backend (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `openai_compatible` (default): needs `OPENAI_COMPATIBLE_HOST` or an API key
    /// - `ollama`: needs `OLLAMA_HOST`
    /// - `mock`: canned receipt, for development
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("AI_BACKEND").unwrap_or_else(|| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_lookup(&lookup).map(AIClient::OpenAICompatible)
            }
            "ollama" => OllamaBackend::from_lookup(&lookup).map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(
                    backend = %backend,
                    "Unknown AI_BACKEND, falling back to openai_compatible"
                );
                OpenAICompatibleBackend::from_lookup(&lookup).map(AIClient::OpenAICompatible)
            }
        }
    }

    /// Create an OpenAI-compatible backend directly
    pub fn openai_compatible(host: &str, model: &str, api_key: Option<&str>) -> Self {
        let backend = match api_key {
            Some(key) => OpenAICompatibleBackend::with_api_key(host, model, key),
            None => OpenAICompatibleBackend::new(host, model),
        };
        AIClient::OpenAICompatible(backend)
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for logs and health output
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Ollama(_) => "ollama",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn extract_items(
        &self,
        image_data: &[u8],
        preferences: &UserPreferences,
    ) -> Result<ExtractedReceipt> {
        match self {
            AIClient::OpenAICompatible(b) => b.extract_items(image_data, preferences).await,
            AIClient::Ollama(b) => b.extract_items(image_data, preferences).await,
            AIClient::Mock(b) => b.extract_items(image_data, preferences).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// System and user text for one extraction request
#[derive(Debug, Clone)]
pub(crate) struct ExtractionPrompt {
    pub system: String,
    pub user: String,
}

/// Render the extraction prompt for these preferences
pub(crate) fn render_extraction_prompt(
    prompts: &RwLock<PromptLibrary>,
    preferences: &UserPreferences,
) -> Result<ExtractionPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    let template = prompts.get(PromptId::ExtractItems)?;
    Ok(ExtractionPrompt {
        system: template.system_section().unwrap_or_default().to_string(),
        user: template.render_user(&preference_vars(preferences)),
    })
}
