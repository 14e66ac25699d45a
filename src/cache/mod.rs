//! Extraction response caching.

mod memory;

pub use memory::{CacheMetrics, MemoryCache};

/// Store for raw LLM responses keyed by a text fingerprint.
/// Implementations must be safe to share across tasks.
pub trait Cache: Send + Sync {
    /// Look up a cached response; absent or expired keys return `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a response together with the token cost of producing it.
    fn set(&self, key: &str, value: String, tokens_used: usize);
}
