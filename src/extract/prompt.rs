//! LLM prompt construction, one prompt per schema type.
//!
//! Pure functions of the input text; every prompt demands strict JSON so
//! the response parser has a fighting chance.

use super::types::SchemaType;

/// Build the extraction prompt for a schema type.
pub fn build_prompt(schema_type: SchemaType, text: &str) -> String {
    match schema_type {
        SchemaType::BusinessRule => business_rules_prompt(text),
        SchemaType::Entity => entities_prompt(text),
        SchemaType::ApiContract => api_contracts_prompt(text),
        SchemaType::UserJourney => user_journeys_prompt(text),
        SchemaType::Glossary => glossary_prompt(text),
    }
}

fn business_rules_prompt(text: &str) -> String {
    format!(
        r#"You are extracting business rules from a project document.

For EACH business rule found, extract:

1. IDENTIFY rules that describe what the system MUST or MUST NOT do
2. Extract the trigger (what initiates this rule)
3. Extract preconditions (what must be true before)
4. Extract constraints with EXACT conditions:
   - For numeric values: specify boundary (< vs <=)
   - For time: specify units and reference point
5. Extract exceptions (who/what is exempt)
6. Extract error cases (what can go wrong)

For EVERY constraint, write pseudocode that can be verified.
If AMBIGUOUS: flag as needs_clarification.

OUTPUT FORMAT (strict JSON):
{{
  "business_rules": [
    {{
      "id": "BR-XXX",
      "version": "1.0",
      "status": "draft",
      "title": "Short descriptive title",
      "description": "Detailed description",
      "priority": "high|medium|low",
      "specification": {{
        "trigger": "What initiates this rule",
        "preconditions": ["condition1", "condition2"],
        "constraints": [
          {{
            "id": "C1",
            "type": "time_based|value_based|state_based|relationship_based",
            "expression": "Human readable expression",
            "pseudocode": "machine_parseable_expression",
            "boundary": "inclusive|exclusive",
            "unit": "hours|minutes|days|currency|count"
          }}
        ],
        "exceptions": [
          {{
            "id": "E1",
            "condition": "When exception applies",
            "modified_constraint": "How constraint changes"
          }}
        ],
        "error_cases": [
          {{
            "condition": "When error occurs",
            "error_code": "ERR_SNAKE_CASE",
            "error_message": "Human readable message",
            "http_status": 400
          }}
        ]
      }},
      "traceability": {{
        "source_document": "document name",
        "source_quote": "original text from document"
      }},
      "confidence": 0.85
    }}
  ]
}}

DOCUMENT TEXT:
{text}

Return ONLY valid JSON. Do not include markdown code fences."#
    )
}

fn entities_prompt(text: &str) -> String {
    format!(
        r#"Extract entities from the document. For each entity: name, fields with types/required flags, relationships, traceability.

OUTPUT (strict JSON):
{{"entities":[{{"id":"ENT-XXX","version":"1.0","status":"draft","name":"EntityName","description":"...","fields":[{{"name":"field","type":"string","required":true}}],"relationships":[{{"entity":"Related","type":"one-to-many"}}],"traceability":{{"source_document":"..."}}}}]}}

DOCUMENT:
{text}

Return ONLY valid JSON, no markdown fences."#
    )
}

fn api_contracts_prompt(text: &str) -> String {
    format!(
        r#"Extract API contracts. For each endpoint: path, method (GET|POST|PUT|PATCH|DELETE), request (params/query/body), response status codes, traceability.

OUTPUT (strict JSON):
{{"api_contracts":[{{"id":"API-XXX","version":"1.0","status":"draft","endpoint":"/api/path","method":"GET","description":"...","request":{{"params":{{}}}},"response":{{"200":{{"description":"Success"}}}},"traceability":{{"source_document":"..."}}}}]}}

DOCUMENT:
{text}

Return ONLY valid JSON, no markdown fences."#
    )
}

fn user_journeys_prompt(text: &str) -> String {
    format!(
        r#"Extract user journeys. For each: name, actor (user role), goal, preconditions, sequential steps (actor action, system response, validation), postconditions, related rules, traceability.

OUTPUT (strict JSON):
{{"user_journeys":[{{"id":"UJ-XXX","version":"1.0","status":"draft","name":"Journey","actor":"User","goal":"...","description":"...","preconditions":[],"steps":[{{"step":1,"actor_action":"...","system_response":"..."}}],"postconditions":[],"traceability":{{"source_document":"..."}}}}]}}

DOCUMENT:
{text}

Return ONLY valid JSON, no markdown fences."#
    )
}

fn glossary_prompt(text: &str) -> String {
    format!(
        r#"Extract glossary terms. For each: term name, definition, related terms, examples, context, traceability.

OUTPUT (strict JSON):
{{"glossary":[{{"id":"GL-XXX","term":"Term","definition":"...","related_terms":[],"examples":[],"context":"...","traceability":{{"source_document":"..."}}}}]}}

DOCUMENT:
{text}

Return ONLY valid JSON, no markdown fences."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_prompt_embeds_text() {
        let prompt = build_prompt(SchemaType::BusinessRule, "Orders ship within 24 hours.");
        assert!(prompt.contains("Orders ship within 24 hours."));
        assert!(prompt.contains("business_rules"));
        assert!(prompt.contains("boundary"));
        assert!(prompt.contains("pseudocode"));
    }

    #[test]
    fn test_entity_prompt_mentions_fields() {
        let prompt = build_prompt(SchemaType::Entity, "The User entity has email.");
        assert!(prompt.contains("entities"));
        assert!(prompt.contains("fields"));
    }

    #[test]
    fn test_api_contract_prompt_mentions_endpoint() {
        let prompt = build_prompt(SchemaType::ApiContract, "GET /api/users");
        assert!(prompt.contains("api_contracts"));
        assert!(prompt.contains("endpoint"));
    }

    #[test]
    fn test_user_journey_prompt_mentions_steps() {
        let prompt = build_prompt(SchemaType::UserJourney, "User logs in.");
        assert!(prompt.contains("user_journeys"));
        assert!(prompt.contains("steps"));
    }

    #[test]
    fn test_glossary_prompt_mentions_definition() {
        let prompt = build_prompt(SchemaType::Glossary, "An order is a purchase request.");
        assert!(prompt.contains("glossary"));
        assert!(prompt.contains("definition"));
    }
}
