//! Cross-cutting item metadata: traceability, provenance, ambiguity
//! flags and generated test requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Links an extracted item back to the document it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Traceability {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_document: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_section: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_quote: String,
}

impl Traceability {
    /// Any evidence at all counts as traceable.
    pub fn has_evidence(&self) -> bool {
        !self.source_document.is_empty() || !self.source_quote.is_empty()
    }
}

/// Creation provenance and confidence, attached by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clarification_questions: Vec<String>,
}

/// Marks a field whose intended meaning could not be determined.
///
/// Purely additive: flags never block persistence, they queue the item
/// for human review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbiguityFlag {
    /// Dotted path into the item, e.g. `specification.constraints[0].unit`
    pub field: String,
    pub interpretations: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub clarification_question: String,
}

/// Test scaffolding categories derived from a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    HappyPath,
    ErrorCase,
    EdgeCase,
    ExceptionCase,
}

/// Expected outcome of a generated test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expected {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// A generated (never hand-authored) test requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRequirement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TestKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    pub scenario: String,
    pub expected: Expected,
}
