//! Ollama backend implementation
//!
//! HTTP client for Ollama's `/api/generate` endpoint with a local vision
//! model (llama3.2-vision, llava, ...). Uses the prompt library for
//! customizable prompts.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::UserPreferences;
use crate::prompts::PromptLibrary;

use super::parsing::parse_extraction_response;
use super::types::ExtractedReceipt;
use super::{render_extraction_prompt, AIBackend};

pub const DEFAULT_MODEL: &str = "llama3.2-vision";

/// Ollama vision backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Use a specific prompt library instead of the default one
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty())?;
        let model = lookup("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self::new(&host, &model))
    }
}

/// Request to Ollama API with images (for vision models)
#[derive(Debug, Serialize)]
struct OllamaVisionRequest {
    model: String,
    system: String,
    prompt: String,
    images: Vec<String>,
    format: &'static str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn extract_items(
        &self,
        image_data: &[u8],
        preferences: &UserPreferences,
    ) -> Result<ExtractedReceipt> {
        let prompt = render_extraction_prompt(&self.prompts, preferences)?;
        let base64_image = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = OllamaVisionRequest {
            model: self.model.clone(),
            system: prompt.system,
            prompt: prompt.user,
            images: vec![base64_image],
            format: "json",
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, message });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama extraction response: {}", ollama_response.response);

        parse_extraction_response(&ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockVisionServer;

    fn backend(url: &str) -> OllamaBackend {
        OllamaBackend::new(url, "llava").with_prompts(PromptLibrary::embedded_only())
    }

    #[test]
    fn test_from_lookup_requires_host() {
        assert!(OllamaBackend::from_lookup(|_| None).is_none());

        let backend = OllamaBackend::from_lookup(|k| match k {
            "OLLAMA_HOST" => Some("http://gpu-box:11434/".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(backend.host(), "http://gpu-box:11434");
        assert_eq!(backend.model(), DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_extract_items_against_mock_server() {
        let server = MockVisionServer::start().await;
        let receipt = backend(&server.url())
            .extract_items(b"receipt", &UserPreferences::default())
            .await
            .unwrap();
        assert!(!receipt.is_empty());

        let requests = server.requests();
        assert_eq!(requests[0].path, "/api/generate");
        let body = &requests[0].body;
        assert_eq!(body["model"], "llava");
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["images"][0], "cmVjZWlwdA==");
        assert!(body["system"]
            .as_str()
            .unwrap()
            .contains("receipt text extraction assistant"));
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let server = MockVisionServer::failing(500, "model not loaded").await;
        let err = backend(&server.url())
            .extract_items(b"receipt", &UserPreferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockVisionServer::start().await;
        assert!(backend(&server.url()).health_check().await);
        assert!(!backend("http://127.0.0.1:1").health_check().await);
    }
}
