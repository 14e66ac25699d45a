//! Business rule specification types: constraints, exceptions, error cases.

use serde::{Deserialize, Deserializer, Serialize};

/// Whether a numeric/time threshold includes its limit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Inclusive,
    Exclusive,
}

impl Boundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boundary::Inclusive => "inclusive",
            Boundary::Exclusive => "exclusive",
        }
    }
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint classification used by the ambiguity and test generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    TimeBased,
    ValueBased,
    StateBased,
    RelationshipBased,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::TimeBased => "time_based",
            ConstraintKind::ValueBased => "value_based",
            ConstraintKind::StateBased => "state_based",
            ConstraintKind::RelationshipBased => "relationship_based",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "time_based" => Some(ConstraintKind::TimeBased),
            "value_based" => Some(ConstraintKind::ValueBased),
            "state_based" => Some(ConstraintKind::StateBased),
            "relationship_based" => Some(ConstraintKind::RelationshipBased),
            _ => None,
        }
    }
}

/// A single machine-checkable condition inside a business rule.
///
/// `boundary` starts out as whatever the extractor produced; the boundary
/// detector fills it in from the expression where it is missing. A
/// constraint that still has no boundary is not fatal, but it must carry
/// an ambiguity flag before the item is considered resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub id: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de_constraint_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<ConstraintKind>,
    #[serde(default)]
    pub expression: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pseudocode: String,
    #[serde(
        default,
        deserialize_with = "de_boundary",
        skip_serializing_if = "Option::is_none"
    )]
    pub boundary: Option<Boundary>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

/// An exemption from one or more constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Exception {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub modified_constraint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies_to: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// An action the system must take when the rule fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideEffect {
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
    #[serde(default)]
    pub required: bool,
}

/// What goes wrong when a constraint is violated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorCase {
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

/// The specification section of a business rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Specification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<Exception>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub side_effects: Vec<SideEffect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_cases: Vec<ErrorCase>,
}

// LLM output frequently carries "" or junk in enum-valued fields. Treat
// those as absent at parse time; schema validation still rejects bad
// values on the serialized wire shape.
fn de_boundary<'de, D>(deserializer: D) -> Result<Option<Boundary>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| match s {
        "inclusive" => Some(Boundary::Inclusive),
        "exclusive" => Some(Boundary::Exclusive),
        _ => None,
    }))
}

fn de_constraint_kind<'de, D>(deserializer: D) -> Result<Option<ConstraintKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ConstraintKind::parse))
}
