//! The universal knowledge item envelope.
//!
//! One envelope covers all five item types. The wire shape is a tagged
//! union keyed by `type`, with type-specific fields omitted when empty so
//! a single JSON schema can validate every shape via type-conditional
//! required-field rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::meta::{AmbiguityFlag, Metadata, TestRequirement, Traceability};
use super::spec::Specification;

/// A field/attribute on a domain entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A relationship between two entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    pub entity: String,
    #[serde(rename = "type", default)]
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub foreign_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cascade: String,
}

/// An invariant that must always hold for an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invariant {
    pub name: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Request shape of an API contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub body: BTreeMap<String, serde_json::Value>,
}

/// Per-status-code response shape of an API contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// One step of a user journey.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JourneyStep {
    #[serde(default)]
    pub step: u32,
    #[serde(default)]
    pub actor_action: String,
    #[serde(default)]
    pub system_response: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business_rules: Vec<String>,
}

/// Type-specific payload of a knowledge item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemBody {
    BusinessRule {
        specification: Specification,
    },
    Entity {
        #[serde(default)]
        fields: Vec<EntityField>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        relationships: Vec<Relationship>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        invariants: Vec<Invariant>,
    },
    ApiContract {
        endpoint: String,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<ApiRequest>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        response: BTreeMap<String, ApiResponse>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        implements_rules: Vec<String>,
    },
    UserJourney {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        name: String,
        #[serde(default)]
        actor: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        goal: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        preconditions: Vec<String>,
        #[serde(default)]
        steps: Vec<JourneyStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        postconditions: Vec<String>,
    },
    Glossary {
        term: String,
        definition: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        context: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        related_terms: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        examples: Vec<String>,
    },
}

impl ItemBody {
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemBody::BusinessRule { .. } => "business_rule",
            ItemBody::Entity { .. } => "entity",
            ItemBody::ApiContract { .. } => "api_contract",
            ItemBody::UserJourney { .. } => "user_journey",
            ItemBody::Glossary { .. } => "glossary",
        }
    }
}

/// A single structured, schema-validatable unit of extracted knowledge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    #[serde(flatten)]
    pub body: ItemBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_requirements: Vec<TestRequirement>,
    #[serde(default)]
    pub traceability: Traceability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambiguity_flags: Vec<AmbiguityFlag>,
}

impl KnowledgeItem {
    pub fn item_type(&self) -> &'static str {
        self.body.type_name()
    }

    /// Business rule specification, if this item is a business rule.
    pub fn specification(&self) -> Option<&Specification> {
        match &self.body {
            ItemBody::BusinessRule { specification } => Some(specification),
            _ => None,
        }
    }

    pub fn specification_mut(&mut self) -> Option<&mut Specification> {
        match &mut self.body {
            ItemBody::BusinessRule { specification } => Some(specification),
            _ => None,
        }
    }
}
