//! JSON Schema validation of knowledge items.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::error::{KnowlexError, Result};
use crate::model::KnowledgeItem;

/// One field that failed schema validation.
#[derive(Debug, Clone)]
pub struct SchemaViolation {
    /// JSON pointer into the validated document
    pub path: String,
    pub message: String,
    /// The offending value, when it is small enough to be useful
    pub value: Option<Value>,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            &self.path
        };
        write!(f, "validation error in field '{}': {}", path, self.message)
    }
}

/// Every violation found in one validation pass. Callers get the full
/// set at once rather than fixing fields one rejection at a time.
#[derive(Debug, Clone, Default)]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

impl SchemaViolations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no validation errors");
        }
        let joined = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Validate an arbitrary JSON document against the schema at
/// `schema_path`. The schema is read and compiled per call so edits to
/// the schema file take effect without a restart.
pub fn validate_value(document: &Value, schema_path: &Path) -> Result<()> {
    let schema_text = std::fs::read_to_string(schema_path)?;
    let schema: Value = serde_json::from_str(&schema_text)
        .map_err(|e| KnowlexError::Parse(format!("schema file is not valid JSON: {e}")))?;

    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| KnowlexError::Parse(format!("invalid schema: {e}")))?;

    let violations: Vec<SchemaViolation> = validator
        .iter_errors(document)
        .map(|error| SchemaViolation {
            path: error.instance_path.to_string(),
            message: error.to_string(),
            value: document.pointer(&error.instance_path.to_string()).cloned(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(KnowlexError::Schema(SchemaViolations(violations)))
    }
}

/// Validate a document expected to be a specific item type. A missing
/// or different `type` tag fails before the schema pass runs.
pub fn validate_by_type(item_type: &str, document: &Value, schema_path: &Path) -> Result<()> {
    let actual = document.get("type").and_then(Value::as_str).unwrap_or("");
    if actual != item_type {
        return Err(KnowlexError::Schema(SchemaViolations(vec![
            SchemaViolation {
                path: "/type".to_string(),
                message: format!("expected type '{item_type}', found '{actual}'"),
                value: document.get("type").cloned(),
            },
        ])));
    }
    validate_value(document, schema_path)
}

/// Serialize a knowledge item and validate its wire shape.
pub fn validate_item(item: &KnowledgeItem, schema_path: &Path) -> Result<()> {
    let document = serde_json::to_value(item)
        .map_err(|e| KnowlexError::Parse(format!("item does not serialize: {e}")))?;
    validate_value(&document, schema_path)
}
