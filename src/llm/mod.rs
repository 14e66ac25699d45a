//! LLM client abstraction with retry and circuit-breaker protection.

mod breaker;
mod ollama;
mod retry;

pub use breaker::CircuitBreaker;
pub use ollama::OllamaClient;
pub use retry::retry_with_backoff;

use async_trait::async_trait;

use crate::error::Result;

/// Completed model call: the raw text plus the token cost of producing it.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tokens_used: usize,
}

/// A text-completion backend. `task_type` labels the call for logging
/// and lets backends route to different models per task.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn call(&self, prompt: &str, task_type: &str) -> Result<LlmResponse>;
}
