//! Request/response envelopes for the extraction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::model::{
    ApiRequest, ApiResponse, EntityField, ItemBody, JourneyStep, KnowledgeItem, Metadata,
    Relationship, Specification, Traceability,
};

/// The five knowledge shapes the pipeline can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    BusinessRule,
    Entity,
    ApiContract,
    UserJourney,
    Glossary,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::BusinessRule => "business_rule",
            SchemaType::Entity => "entity",
            SchemaType::ApiContract => "api_contract",
            SchemaType::UserJourney => "user_journey",
            SchemaType::Glossary => "glossary",
        }
    }
}

impl FromStr for SchemaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business_rule" => Ok(SchemaType::BusinessRule),
            "entity" => Ok(SchemaType::Entity),
            "api_contract" => Ok(SchemaType::ApiContract),
            "user_journey" => Ok(SchemaType::UserJourney),
            "glossary" => Ok(SchemaType::Glossary),
            other => Err(format!("unsupported schema type: {other}")),
        }
    }
}

/// Flags controlling which extraction paths are attempted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub use_llm: bool,
    pub use_fallback: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            use_llm: true,
            use_fallback: true,
        }
    }
}

/// A knowledge extraction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    #[serde(default)]
    pub source: String,
    pub schema_type: SchemaType,
    #[serde(default)]
    pub options: ExtractOptions,
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Llm,
    Regex,
}

/// A soft, per-chunk failure attached to an otherwise-successful result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionError {
    pub code: String,
    pub message: String,
}

/// Timing and provenance metadata for one extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tokens_used: usize,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub processing_ms: u64,
}

/// A business rule as it comes out of the LLM or fallback path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub specification: Specification,
    #[serde(default)]
    pub traceability: Traceability,
    #[serde(default)]
    pub confidence: f64,
}

impl BusinessRule {
    /// Wrap the rule in the universal envelope, stamping provenance.
    pub fn into_item(self, created_by: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: self.id,
            version: self.version,
            status: self.status,
            title: self.title,
            description: self.description,
            category: String::new(),
            priority: self.priority,
            body: ItemBody::BusinessRule {
                specification: self.specification,
            },
            test_requirements: Vec::new(),
            traceability: self.traceability,
            metadata: Some(Metadata {
                created_at: Some(Utc::now()),
                created_by: created_by.to_string(),
                confidence: self.confidence,
                needs_clarification: false,
                clarification_questions: Vec::new(),
            }),
            ambiguity_flags: Vec::new(),
        }
    }
}

/// A domain entity as parsed from extractor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<EntityField>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub traceability: Traceability,
}

/// An API endpoint contract as parsed from extractor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiContract {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub request: Option<ApiRequest>,
    #[serde(default)]
    pub response: BTreeMap<String, ApiResponse>,
    #[serde(default)]
    pub traceability: Traceability,
}

/// A user journey as parsed from extractor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserJourney {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub steps: Vec<JourneyStep>,
    #[serde(default)]
    pub postconditions: Vec<String>,
    #[serde(default)]
    pub traceability: Traceability,
}

/// A glossary term as parsed from extractor output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryTerm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub related_terms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub traceability: Traceability,
}

/// The orchestrator's output envelope. Created fresh per call and never
/// shared across requests; the cache stores only raw LLM response text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business_rules: Vec<BusinessRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_contracts: Vec<ApiContract>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_journeys: Vec<UserJourney>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary: Vec<GlossaryTerm>,
    pub confidence: f64,
    pub source: ExtractionSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExtractionError>,
    #[serde(default)]
    pub metadata: ExtractionMetadata,
}

impl ExtractResult {
    pub fn empty(source: ExtractionSource) -> Self {
        Self {
            business_rules: Vec::new(),
            entities: Vec::new(),
            api_contracts: Vec::new(),
            user_journeys: Vec::new(),
            glossary: Vec::new(),
            confidence: 0.0,
            source,
            errors: Vec::new(),
            metadata: ExtractionMetadata::default(),
        }
    }

    /// Convert every extracted item into the universal envelope.
    pub fn into_items(self) -> Vec<KnowledgeItem> {
        let created_by = match self.source {
            ExtractionSource::Llm => "extractor:llm",
            ExtractionSource::Regex => "extractor:regex",
        };
        let mut items: Vec<KnowledgeItem> = Vec::new();

        for rule in self.business_rules {
            items.push(rule.into_item(created_by));
        }
        for e in self.entities {
            items.push(KnowledgeItem {
                id: e.id,
                version: e.version,
                status: e.status,
                title: e.name,
                description: e.description,
                category: String::new(),
                priority: String::new(),
                body: ItemBody::Entity {
                    fields: e.fields,
                    relationships: e.relationships,
                    invariants: Vec::new(),
                },
                test_requirements: Vec::new(),
                traceability: e.traceability,
                metadata: None,
                ambiguity_flags: Vec::new(),
            });
        }
        for c in self.api_contracts {
            items.push(KnowledgeItem {
                id: c.id,
                version: c.version,
                status: c.status,
                title: format!("{} {}", c.method, c.endpoint),
                description: c.description,
                category: String::new(),
                priority: String::new(),
                body: ItemBody::ApiContract {
                    endpoint: c.endpoint,
                    method: c.method,
                    request: c.request,
                    response: c.response,
                    implements_rules: Vec::new(),
                },
                test_requirements: Vec::new(),
                traceability: c.traceability,
                metadata: None,
                ambiguity_flags: Vec::new(),
            });
        }
        for j in self.user_journeys {
            items.push(KnowledgeItem {
                id: j.id,
                version: j.version,
                status: j.status,
                title: j.name.clone(),
                description: j.description,
                category: String::new(),
                priority: String::new(),
                body: ItemBody::UserJourney {
                    name: j.name,
                    actor: j.actor,
                    goal: j.goal,
                    preconditions: j.preconditions,
                    steps: j.steps,
                    postconditions: j.postconditions,
                },
                test_requirements: Vec::new(),
                traceability: j.traceability,
                metadata: None,
                ambiguity_flags: Vec::new(),
            });
        }
        for g in self.glossary {
            items.push(KnowledgeItem {
                id: g.id,
                version: String::new(),
                status: String::new(),
                title: g.term.clone(),
                description: String::new(),
                category: String::new(),
                priority: String::new(),
                body: ItemBody::Glossary {
                    term: g.term,
                    definition: g.definition,
                    context: g.context,
                    related_terms: g.related_terms,
                    examples: g.examples,
                },
                test_requirements: Vec::new(),
                traceability: g.traceability,
                metadata: None,
                ambiguity_flags: Vec::new(),
            });
        }

        items
    }
}
