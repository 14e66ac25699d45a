use thiserror::Error;

use crate::schema::SchemaViolations;

/// Main error type for knowlex
#[derive(Error, Debug)]
pub enum KnowlexError {
    /// Input contract violations (empty/oversized text, bad arguments)
    #[error("validation failed for '{field}': {message}")]
    Validation { field: &'static str, message: String },

    /// LLM transport/provider errors
    #[error("LLM call failed: {0}")]
    Llm(String),

    /// LLM output that is not well-formed per the expected envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// A constraint boundary that cannot be detected from its expression
    #[error("ambiguous boundary: {0}")]
    AmbiguousBoundary(String),

    /// Aggregated schema violations, one entry per violated field
    #[error("schema validation failed: {0}")]
    Schema(SchemaViolations),

    /// Fast-fail while the circuit breaker cooldown is running
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Retryable errors exhausted their budget
    #[error("max retries ({attempts}) exceeded: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    /// Caller cancelled during a retry backoff wait
    #[error("operation cancelled")]
    Cancelled,

    /// Implementation-status state machine rejection
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Change request lookup failures
    #[error("change request not found: {0}")]
    ChangeRequestNotFound(String),

    /// Both extraction paths failed or were disabled
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KnowlexError {
    /// True when a transport error is worth retrying with backoff.
    ///
    /// Classification is by message content, mirroring what providers
    /// actually return: timeouts, rate limits, transient network failures
    /// and the 502/503/429 status codes.
    pub fn is_retryable(&self) -> bool {
        const RETRYABLE: [&str; 8] = [
            "timeout",
            "rate limit",
            "temporary",
            "network",
            "connection",
            "503",
            "502",
            "429",
        ];
        let msg = self.to_string().to_lowercase();
        RETRYABLE.iter().any(|pattern| msg.contains(pattern))
    }
}

/// Convenient Result type using KnowlexError
pub type Result<T> = std::result::Result<T, KnowlexError>;
