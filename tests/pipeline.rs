//! End-to-end pipeline tests: extraction through enrichment to schema
//! validation, using only the public API.

use async_trait::async_trait;
use knowlex::analysis::enrich_item;
use knowlex::cache::MemoryCache;
use knowlex::error::{KnowlexError, Result};
use knowlex::extract::{ExtractOptions, ExtractRequest, ExtractionSource, KnowledgeExtractor, SchemaType};
use knowlex::llm::{CircuitBreaker, LlmClient, LlmResponse};
use knowlex::model::{Boundary, ConstraintKind, ItemBody};
use knowlex::schema;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SHIPPING_TEXT: &str =
    "Orders must ship within 24 hours of payment, except for international orders which get 48 hours.";

const LLM_RESPONSE: &str = r#"{
    "business_rules": [{
        "id": "BR-001",
        "version": "1.0",
        "status": "draft",
        "title": "Orders ship within 24 hours",
        "description": "Orders must ship within 24 hours of payment",
        "priority": "high",
        "specification": {
            "constraints": [{
                "id": "C1",
                "type": "time_based",
                "expression": "within 24 hours of payment",
                "boundary": "inclusive",
                "unit": "hours"
            }],
            "exceptions": [{
                "id": "E1",
                "condition": "international orders",
                "modified_constraint": "within 48 hours of payment"
            }]
        },
        "traceability": {
            "source_document": "orders.md",
            "source_quote": "Orders must ship within 24 hours of payment"
        },
        "confidence": 0.85
    }]
}"#;

struct MockLlm {
    response: Result<String>,
    calls: AtomicUsize,
}

impl MockLlm {
    fn ok(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            response: Err(KnowlexError::Llm(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn call(&self, _prompt: &str, _task_type: &str) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(LlmResponse {
                text: text.clone(),
                tokens_used: 42,
            }),
            Err(e) => Err(KnowlexError::Llm(e.to_string())),
        }
    }
}

fn extractor(llm: Arc<MockLlm>) -> KnowledgeExtractor {
    let cache = Arc::new(MemoryCache::new(16, Duration::from_secs(3600)));
    let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
    KnowledgeExtractor::new(llm, cache, breaker).with_max_retries(1)
}

fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas/knowledge_schema.json")
}

fn shipping_request(use_llm: bool) -> ExtractRequest {
    ExtractRequest {
        text: SHIPPING_TEXT.to_string(),
        source: "orders.md".to_string(),
        schema_type: SchemaType::BusinessRule,
        options: ExtractOptions {
            use_llm,
            use_fallback: true,
        },
    }
}

#[tokio::test]
async fn fallback_pipeline_produces_valid_enriched_items() {
    let llm = Arc::new(MockLlm::failing("should not be called"));
    let extractor = extractor(Arc::clone(&llm));

    let result = extractor
        .extract(&shipping_request(false), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.source, ExtractionSource::Regex);
    assert_eq!(llm.calls(), 0);

    let mut items = result.into_items();
    assert!(!items.is_empty());

    for item in &mut items {
        enrich_item(item);
        schema::validate_item(item, &schema_path()).unwrap();
    }

    // The shipping sentence yields a time-based constraint in hours with
    // the international-orders exception attached.
    let rule = items
        .iter()
        .find(|i| match &i.body {
            ItemBody::BusinessRule { specification } => specification
                .constraints
                .iter()
                .any(|c| c.kind == Some(ConstraintKind::TimeBased)),
            _ => false,
        })
        .expect("expected a rule with a time_based constraint");
    let ItemBody::BusinessRule { specification } = &rule.body else {
        unreachable!()
    };
    let constraint = specification
        .constraints
        .iter()
        .find(|c| c.kind == Some(ConstraintKind::TimeBased))
        .unwrap();
    assert_eq!(constraint.unit, "hour");
    // "within" resolves to an inclusive boundary during enrichment
    assert_eq!(constraint.boundary, Some(Boundary::Inclusive));

    let has_exception = items.iter().any(|i| match &i.body {
        ItemBody::BusinessRule { specification } => specification
            .exceptions
            .iter()
            .any(|e| e.condition.contains("international orders")),
        _ => false,
    });
    assert!(has_exception);

    // Enrichment always leaves generated test requirements behind
    assert!(!rule.test_requirements.is_empty());
    assert!(rule
        .test_requirements
        .iter()
        .any(|t| t.scenario.starts_with("Execute")));
}

#[tokio::test]
async fn llm_pipeline_caches_and_validates() {
    let llm = Arc::new(MockLlm::ok(LLM_RESPONSE));
    let extractor = extractor(Arc::clone(&llm));
    let cancel = CancellationToken::new();
    let req = shipping_request(true);

    let first = extractor.extract(&req, &cancel).await.unwrap();
    assert_eq!(first.source, ExtractionSource::Llm);
    assert!(!first.metadata.cache_hit);
    assert_eq!(first.metadata.tokens_used, 42);
    assert_eq!(llm.calls(), 1);

    // Identical text is served from the cache without another LLM call
    let second = extractor.extract(&req, &cancel).await.unwrap();
    assert!(second.metadata.cache_hit);
    assert_eq!(llm.calls(), 1);
    assert!((first.confidence - second.confidence).abs() < f64::EPSILON);

    let mut items = second.into_items();
    assert_eq!(items.len(), 1);
    enrich_item(&mut items[0]);
    schema::validate_item(&items[0], &schema_path()).unwrap();

    // The enriched rule carries tests covering the exception path
    assert!(items[0]
        .test_requirements
        .iter()
        .any(|t| t.scenario.contains("international orders")));
}

#[tokio::test]
async fn llm_failure_falls_back_to_regex() {
    let llm = Arc::new(MockLlm::failing("invalid request"));
    let extractor = extractor(Arc::clone(&llm));

    let result = extractor
        .extract(&shipping_request(true), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.source, ExtractionSource::Regex);
    assert_eq!(llm.calls(), 1);
    assert!((result.confidence - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn batch_extraction_merges_and_validates() {
    let llm = Arc::new(MockLlm::failing("unused"));
    let extractor = extractor(Arc::clone(&llm)).with_chunk_size(1000);

    let text = format!(
        "{SHIPPING_TEXT} The system must log every status change. Users cannot cancel shipped orders."
    );
    let req = ExtractRequest {
        text,
        source: "orders.md".to_string(),
        schema_type: SchemaType::BusinessRule,
        options: ExtractOptions {
            use_llm: false,
            use_fallback: true,
        },
    };

    let result = extractor
        .extract_batch(&req, &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.business_rules.len() >= 3);

    // Merged rule IDs stay unique after deduplication
    let mut ids: Vec<_> = result
        .business_rules
        .iter()
        .map(|r| r.id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), result.business_rules.len());

    for mut item in result.into_items() {
        enrich_item(&mut item);
        schema::validate_item(&item, &schema_path()).unwrap();
    }
}
