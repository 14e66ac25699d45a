use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{KnowlexError, Result};
use crate::llm::{LlmClient, LlmResponse};

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response body from the Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

/// Client for a local Ollama server.
///
/// Non-2xx statuses are surfaced with the status code in the error text
/// so the retry layer can decide whether the failure is transient.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server address (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "llama3.1")
    /// * `timeout` - Per-request timeout
    ///
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn call(&self, prompt: &str, task_type: &str) -> Result<LlmResponse> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| KnowlexError::Llm(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(KnowlexError::Llm(format!(
                "ollama API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| KnowlexError::Llm(format!("failed to parse response: {}", e)))?;

        log::debug!(
            "ollama {} call took {:?} ({} tokens)",
            task_type,
            start.elapsed(),
            result.prompt_eval_count + result.eval_count
        );

        Ok(LlmResponse {
            text: result.response,
            tokens_used: result.prompt_eval_count + result.eval_count,
        })
    }
}
