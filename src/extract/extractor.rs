//! Extraction orchestrator: cache, LLM path with resilience, regex fallback.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::cache::Cache;
use crate::error::{KnowlexError, Result};
use crate::extract::chunker::TextChunker;
use crate::extract::fallback::FallbackExtractor;
use crate::extract::parser;
use crate::extract::prompt::build_prompt;
use crate::extract::scoring::ConfidenceScorer;
use crate::extract::types::{
    BusinessRule, ExtractRequest, ExtractResult, ExtractionError, ExtractionSource,
};
use crate::llm::{retry_with_backoff, CircuitBreaker, LlmClient};

const MAX_TEXT_CHARS: usize = 100_000;
const CHUNK_CHARS: usize = 4_000;
const MAX_RETRIES: usize = 3;

/// Orchestrates a single extraction: cache lookup, LLM call behind the
/// circuit breaker and retry policy, regex fallback when the LLM path is
/// unavailable or disabled.
pub struct KnowledgeExtractor {
    llm: Arc<dyn LlmClient>,
    scorer: ConfidenceScorer,
    fallback: FallbackExtractor,
    cache: Arc<dyn Cache>,
    breaker: Arc<CircuitBreaker>,
    max_retries: usize,
    chunk_size: usize,
}

impl KnowledgeExtractor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        cache: Arc<dyn Cache>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            llm,
            scorer: ConfidenceScorer::new(),
            fallback: FallbackExtractor::new(),
            cache,
            breaker,
            max_retries: MAX_RETRIES,
            chunk_size: CHUNK_CHARS,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Extract knowledge items from `req.text`.
    ///
    /// A successful result always carries at least one item; when every
    /// enabled path fails the error of the last one is returned.
    pub async fn extract(
        &self,
        req: &ExtractRequest,
        cancel: &CancellationToken,
    ) -> Result<ExtractResult> {
        let start = Instant::now();
        validate_request(req)?;

        let cache_key = cache_key(&req.text);

        if let Some(cached) = self.cache.get(&cache_key) {
            log::debug!("cache hit for extraction of {}", req.source);
            // A stale or corrupt cached payload falls through to a
            // fresh extraction rather than failing the request.
            if let Ok(mut result) = parser::parse(&cached) {
                self.rescore(&mut result);
                result.source = ExtractionSource::Llm;
                result.metadata.cache_hit = true;
                result.metadata.processed_at = Some(Utc::now());
                result.metadata.processing_ms = start.elapsed().as_millis() as u64;
                return Ok(result);
            }
            log::warn!("cached response no longer parses, re-extracting");
        }

        if req.options.use_llm {
            match self.extract_with_llm(req, &cache_key, cancel).await {
                Ok(mut result) => {
                    result.metadata.processed_at = Some(Utc::now());
                    result.metadata.processing_ms = start.elapsed().as_millis() as u64;
                    return Ok(result);
                }
                Err(KnowlexError::Cancelled) => return Err(KnowlexError::Cancelled),
                Err(e) => {
                    log::warn!("LLM extraction failed, trying fallback: {}", e);
                    if !req.options.use_fallback {
                        return Err(e);
                    }
                }
            }
        }

        if req.options.use_fallback {
            let mut result = self.fallback.extract(&req.text)?;
            result.source = ExtractionSource::Regex;
            result.metadata.processed_at = Some(Utc::now());
            result.metadata.processing_ms = start.elapsed().as_millis() as u64;
            return Ok(result);
        }

        Err(KnowlexError::Extraction(
            "LLM extraction disabled and fallback not allowed".to_string(),
        ))
    }

    /// Extract from a large document by splitting it into chunks and
    /// merging the per-chunk rules. Chunk failures are recorded as soft
    /// errors instead of failing the whole batch.
    pub async fn extract_batch(
        &self,
        req: &ExtractRequest,
        cancel: &CancellationToken,
    ) -> Result<ExtractResult> {
        let start = Instant::now();
        validate_request(req)?;

        let chunker = TextChunker::new(self.chunk_size);
        let chunks = chunker.chunk(&req.text);

        let mut all_rules: Vec<BusinessRule> = Vec::new();
        let mut all_errors: Vec<ExtractionError> = Vec::new();
        let mut tokens_used = 0;

        for (i, chunk) in chunks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(KnowlexError::Cancelled);
            }
            let chunk_req = ExtractRequest {
                text: chunk,
                source: format!("{}:chunk-{}", req.source, i),
                schema_type: req.schema_type,
                options: req.options,
            };
            match self.extract(&chunk_req, cancel).await {
                Ok(result) => {
                    tokens_used += result.metadata.tokens_used;
                    all_rules.extend(result.business_rules);
                }
                Err(KnowlexError::Cancelled) => return Err(KnowlexError::Cancelled),
                Err(e) => {
                    all_errors.push(ExtractionError {
                        code: "CHUNK_EXTRACTION_FAILED".to_string(),
                        message: format!("chunk {} failed: {}", i, e),
                    });
                }
            }
        }

        let deduplicated = deduplicate_rules(all_rules);
        let confidence = if deduplicated.is_empty() {
            0.0
        } else {
            self.scorer.score_overall(&deduplicated)
        };

        let mut result = ExtractResult::empty(ExtractionSource::Llm);
        result.business_rules = deduplicated;
        result.confidence = confidence;
        result.errors = all_errors;
        result.metadata.tokens_used = tokens_used;
        result.metadata.processed_at = Some(Utc::now());
        result.metadata.processing_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn extract_with_llm(
        &self,
        req: &ExtractRequest,
        cache_key: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractResult> {
        let prompt = build_prompt(req.schema_type, &req.text);

        let response = retry_with_backoff(self.max_retries, cancel, || {
            let llm = Arc::clone(&self.llm);
            let prompt = prompt.clone();
            async move {
                self.breaker
                    .call(async move { llm.call(&prompt, "knowledge_extraction").await })
                    .await
            }
        })
        .await?;

        let mut result = parser::parse(&response.text)?;
        self.rescore(&mut result);
        result.source = ExtractionSource::Llm;
        result.metadata.tokens_used = response.tokens_used;

        self.cache
            .set(cache_key, response.text, response.tokens_used);

        Ok(result)
    }

    fn rescore(&self, result: &mut ExtractResult) {
        if result.business_rules.is_empty() {
            // Non-business-rule schemas have no structural scorer yet.
            result.confidence = 0.7;
            return;
        }
        for rule in &mut result.business_rules {
            rule.confidence = self.scorer.score_rule(rule);
        }
        result.confidence = self.scorer.score_overall(&result.business_rules);
    }
}

fn validate_request(req: &ExtractRequest) -> Result<()> {
    if req.text.is_empty() {
        return Err(KnowlexError::Validation {
            field: "text",
            message: "text is required".to_string(),
        });
    }
    if req.text.chars().count() > MAX_TEXT_CHARS {
        return Err(KnowlexError::Validation {
            field: "text",
            message: "text exceeds maximum length".to_string(),
        });
    }
    Ok(())
}

/// Fingerprint for the response cache: first 16 bytes of the sha256 of
/// the versioned text, hex-encoded.
fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"extract:business_rules:v1:");
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Drop later duplicates by ID, assigning `BR-<n>` to rules that came
/// back without one. Assignment happens before the seen-check so a
/// synthesized ID participates in deduplication like any other.
fn deduplicate_rules(rules: Vec<BusinessRule>) -> Vec<BusinessRule> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<BusinessRule> = Vec::new();

    for mut rule in rules {
        if rule.id.is_empty() {
            rule.id = format!("BR-{}", unique.len() + 1);
        }
        if seen.insert(rule.id.clone()) {
            unique.push(rule);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedLlm {
        responses: Mutex<Vec<Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn call(&self, _prompt: &str, _task_type: &str) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(KnowlexError::Llm("no scripted response".to_string()));
            }
            responses.remove(0).map(|text| LlmResponse {
                text,
                tokens_used: 42,
            })
        }
    }

    fn rule_response() -> String {
        r#"{
            "business_rules": [{
                "id": "BR-001",
                "title": "Order shipping deadline",
                "description": "Orders must ship within 24 hours of payment confirmation",
                "priority": "high",
                "status": "extracted",
                "specification": {
                    "constraints": [{
                        "id": "C-001",
                        "type": "time_based",
                        "expression": "ship within 24 hours",
                        "unit": "hour",
                        "boundary": "inclusive"
                    }]
                },
                "traceability": {
                    "source_document": "ops.md",
                    "source_section": "Shipping",
                    "source_quote": "Orders must ship within 24 hours"
                }
            }]
        }"#
        .to_string()
    }

    fn extractor_with(
        llm: Arc<ScriptedLlm>,
    ) -> (KnowledgeExtractor, Arc<crate::cache::MemoryCache>) {
        let cache = Arc::new(crate::cache::MemoryCache::new(16, Duration::from_secs(60)));
        let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
        let extractor = KnowledgeExtractor::new(llm, Arc::clone(&cache) as Arc<dyn Cache>, breaker)
            .with_max_retries(1);
        (extractor, cache)
    }

    fn request(text: &str) -> ExtractRequest {
        ExtractRequest {
            text: text.to_string(),
            source: "test.md".to_string(),
            schema_type: crate::extract::types::SchemaType::BusinessRule,
            options: Default::default(),
        }
    }

    #[test]
    fn test_cache_key_is_32_hex_chars() {
        let key = cache_key("some requirements text");
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("some requirements text"));
        assert_ne!(key, cache_key("other text"));
    }

    #[test]
    fn test_validate_rejects_empty_and_oversized() {
        let err = validate_request(&request("")).unwrap_err();
        assert!(matches!(err, KnowlexError::Validation { field: "text", .. }));

        let big = "a".repeat(MAX_TEXT_CHARS + 1);
        let err = validate_request(&request(&big)).unwrap_err();
        assert!(matches!(err, KnowlexError::Validation { field: "text", .. }));

        assert!(validate_request(&request("ok")).is_ok());
    }

    #[test]
    fn test_deduplicate_assigns_ids_then_dedups() {
        let rules = vec![
            BusinessRule {
                id: "BR-001".to_string(),
                ..Default::default()
            },
            BusinessRule {
                id: String::new(),
                ..Default::default()
            },
            BusinessRule {
                id: "BR-001".to_string(),
                ..Default::default()
            },
            BusinessRule {
                id: "BR-2".to_string(),
                ..Default::default()
            },
        ];
        let unique = deduplicate_rules(rules);
        // the empty-ID rule becomes BR-2, so the explicit BR-2 is a duplicate
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, "BR-001");
        assert_eq!(unique[1].id, "BR-2");
    }

    #[tokio::test]
    async fn test_llm_path_scores_and_caches() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(rule_response())]));
        let (extractor, cache) = extractor_with(Arc::clone(&llm));
        let cancel = CancellationToken::new();

        let result = extractor
            .extract(&request("Orders must ship fast."), &cancel)
            .await
            .unwrap();
        assert_eq!(result.source, ExtractionSource::Llm);
        assert!(!result.metadata.cache_hit);
        assert_eq!(result.metadata.tokens_used, 42);
        assert_eq!(result.business_rules.len(), 1);
        assert!(result.confidence > 0.0);
        assert!(result.metadata.processed_at.is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_llm_and_rescores() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(rule_response())]));
        let (extractor, _cache) = extractor_with(Arc::clone(&llm));
        let cancel = CancellationToken::new();
        let req = request("Orders must ship fast.");

        let first = extractor.extract(&req, &cancel).await.unwrap();
        let second = extractor.extract(&req, &cancel).await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert!(second.metadata.cache_hit);
        assert_eq!(second.source, ExtractionSource::Llm);
        assert!((second.confidence - first.confidence).abs() < f64::EPSILON);
        assert_eq!(second.business_rules[0].id, first.business_rules[0].id);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back_to_regex() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(KnowlexError::Llm(
            "model unavailable".to_string(),
        ))]));
        let (extractor, _cache) = extractor_with(llm);
        let cancel = CancellationToken::new();

        let result = extractor
            .extract(
                &request("The system must validate all payments before fulfillment."),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(result.source, ExtractionSource::Regex);
        assert_eq!(result.business_rules.len(), 1);
    }

    #[tokio::test]
    async fn test_no_paths_enabled_is_an_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let (extractor, _cache) = extractor_with(llm);
        let cancel = CancellationToken::new();
        let mut req = request("Orders must ship fast.");
        req.options.use_llm = false;
        req.options.use_fallback = false;

        let err = extractor.extract(&req, &cancel).await.unwrap_err();
        assert!(matches!(err, KnowlexError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_both_paths_failing_returns_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(KnowlexError::Llm(
            "model unavailable".to_string(),
        ))]));
        let (extractor, _cache) = extractor_with(llm);
        let cancel = CancellationToken::new();

        // No requirement phrasing, so the fallback finds nothing either.
        let err = extractor
            .extract(&request("Just some prose with no rules."), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, KnowlexError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_batch_merges_chunks_and_dedups() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(rule_response()),
            Ok(rule_response()),
        ]));
        let (extractor, _cache) = extractor_with(llm);
        let extractor = extractor.with_chunk_size(64);
        let cancel = CancellationToken::new();

        let first_sentence = "Orders must ship within one day of payment confirmation. ";
        let text = format!("{first_sentence}{}", "x".repeat(60));
        let mut req = request(&text);
        req.options.use_fallback = false;

        let result = extractor.extract_batch(&req, &cancel).await.unwrap();
        // identical IDs from both chunks collapse to one rule
        assert_eq!(result.business_rules.len(), 1);
        assert!(result.confidence > 0.0);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_batch_records_soft_chunk_errors() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(rule_response()),
            Err(KnowlexError::Llm("model unavailable".to_string())),
        ]));
        let (extractor, _cache) = extractor_with(llm);
        let extractor = extractor.with_chunk_size(64);
        let cancel = CancellationToken::new();

        // Second chunk has no requirement phrasing, so fallback fails too.
        let text = format!(
            "Orders must ship within one day of payment confirmation. {}",
            "y".repeat(60)
        );
        let result = extractor
            .extract_batch(&request(&text), &cancel)
            .await
            .unwrap();
        assert_eq!(result.business_rules.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "CHUNK_EXTRACTION_FAILED");
        assert!(result.errors[0].message.contains("chunk 1"));
    }

    #[tokio::test]
    async fn test_batch_empty_yield_is_zero_confidence() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let (extractor, _cache) = extractor_with(llm);
        let cancel = CancellationToken::new();
        let mut req = request("No rules here at all.");
        req.options.use_llm = false;
        req.options.use_fallback = true;

        let result = extractor.extract_batch(&req, &cancel).await.unwrap();
        assert!(result.business_rules.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.errors.len(), 1);
    }
}
