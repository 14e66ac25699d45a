//! Parses raw LLM text into an [`ExtractResult`].
//!
//! Tolerant of the formatting LLMs actually produce (markdown fences,
//! trailing commas), strict about JSON shape. Missing required fields on
//! individual items become soft [`ExtractionError`] entries rather than
//! hard failures.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::{KnowlexError, Result};

use super::types::{
    ApiContract, BusinessRule, Entity, ExtractionError, ExtractionMetadata, ExtractionSource,
    ExtractResult, GlossaryTerm, UserJourney,
};

#[derive(Debug, Default, Deserialize)]
struct ResponseWrapper {
    #[serde(default)]
    business_rules: Vec<BusinessRule>,
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    api_contracts: Vec<ApiContract>,
    #[serde(default)]
    user_journeys: Vec<UserJourney>,
    #[serde(default)]
    glossary: Vec<GlossaryTerm>,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*").expect("invalid fence regex"))
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([\]\}])").expect("invalid comma regex"))
}

/// Parse a raw LLM response into an extraction result.
pub fn parse(response: &str) -> Result<ExtractResult> {
    let cleaned = clean_response(response);

    let wrapper: ResponseWrapper = match serde_json::from_str(&cleaned) {
        Ok(w) => w,
        Err(first_err) => {
            let repaired = repair_json(&cleaned);
            serde_json::from_str(&repaired).map_err(|_| {
                KnowlexError::Parse(format!("failed to parse JSON: {first_err}"))
            })?
        }
    };

    let mut errors = Vec::new();
    errors.extend(validate_rules(&wrapper.business_rules));
    errors.extend(validate_entities(&wrapper.entities));
    errors.extend(validate_api_contracts(&wrapper.api_contracts));

    Ok(ExtractResult {
        business_rules: wrapper.business_rules,
        entities: wrapper.entities,
        api_contracts: wrapper.api_contracts,
        user_journeys: wrapper.user_journeys,
        glossary: wrapper.glossary,
        confidence: 0.0,
        source: ExtractionSource::Llm,
        errors,
        metadata: ExtractionMetadata::default(),
    })
}

fn clean_response(response: &str) -> String {
    let cleaned = fence_regex().replace_all(response, "");
    cleaned.replace("```", "").trim().to_string()
}

// Fix the JSON errors LLMs most commonly make: trailing commas before
// closing brackets.
fn repair_json(response: &str) -> String {
    trailing_comma_regex().replace_all(response, "$1").into_owned()
}

fn validate_rules(rules: &[BusinessRule]) -> Vec<ExtractionError> {
    let mut errors = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        if rule.title.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_TITLE".to_string(),
                message: format!("Rule {i} missing required field: title"),
            });
        }
        if rule.specification.constraints.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_CONSTRAINTS".to_string(),
                message: format!("Rule {} has no constraints", rule.id),
            });
        }
    }
    errors
}

fn validate_entities(entities: &[Entity]) -> Vec<ExtractionError> {
    let mut errors = Vec::new();
    for (i, entity) in entities.iter().enumerate() {
        if entity.name.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_NAME".to_string(),
                message: format!("Entity {i} missing required field: name"),
            });
        }
        if entity.fields.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_FIELDS".to_string(),
                message: format!("Entity {} has no fields", entity.id),
            });
        }
    }
    errors
}

fn validate_api_contracts(contracts: &[ApiContract]) -> Vec<ExtractionError> {
    let mut errors = Vec::new();
    for (i, contract) in contracts.iter().enumerate() {
        if contract.endpoint.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_ENDPOINT".to_string(),
                message: format!("API contract {i} missing required field: endpoint"),
            });
        }
        if contract.method.is_empty() {
            errors.push(ExtractionError {
                code: "MISSING_METHOD".to_string(),
                message: format!("API contract {} missing required field: method", contract.id),
            });
        }
    }
    errors
}
