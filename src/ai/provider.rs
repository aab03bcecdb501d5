//! AI completion provider
//!
//! The policy components only need one call: send a prompt, get JSON text
//! back. `OllamaProvider` implements it against a local Ollama server using
//! `POST /api/generate` with `format: "json"` and streaming disabled.

use crate::errors::{PolicyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Transport-level timeout; the policy deadline is applied separately
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Requested response format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// Anything that can complete a prompt
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete `prompt`; with `ResponseFormat::Json` the reply must be JSON
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String>;

    /// Short name for logs and health output
    fn name(&self) -> &str;
}

/// Ollama-backed completion provider
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create provider with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create provider with custom configuration
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PolicyError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: match format {
                ResponseFormat::Json => Some("json"),
                ResponseFormat::Text => None,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PolicyError::AiUnavailable(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PolicyError::AiUnavailable(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PolicyError::AiResponse(format!("Failed to parse response: {}", e)))?;

        if body.response.trim().is_empty() {
            return Err(PolicyError::AiResponse("Empty completion".to_string()));
        }

        Ok(body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

/// Ollama non-streaming generate response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OllamaProvider::new().unwrap();
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.base_url(), DEFAULT_OLLAMA_URL);
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::with_config("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            format: Some("json"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);

        let text = GenerateRequest {
            format: None,
            ..request
        };
        assert!(serde_json::to_value(&text).unwrap().get("format").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_ai_failure() {
        let provider = OllamaProvider::with_config("http://127.0.0.1:9", "m").unwrap();
        let err = provider.complete("hi", ResponseFormat::Json).await.unwrap_err();
        assert!(err.is_ai_failure());
    }
}
