//! Ambiguity detection over extracted knowledge items.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{AmbiguityFlag, ConstraintKind, KnowledgeItem};

const VAGUE_TIME_WORDS: &[&str] = &[
    "soon",
    "later",
    "eventually",
    "sometime",
    "quickly",
    "immediately",
    "promptly",
    "asap",
    "as soon as possible",
];

const UNCLEAR_BOUNDARY_WORDS: &[&str] = &[
    "around",
    "approximately",
    "about",
    "roughly",
    "nearly",
    "close to",
    "near",
    "almost",
];

const UNIT_WORDS: &[&str] = &[
    "hour", "minute", "day", "week", "month", "year", "second",
];

const MODAL_WORDS: &[&str] = &["may", "might", "could", "should", "can", "possibly"];

const VAGUE_DESCRIPTION_WORDS: &[&str] = &[
    "as needed",
    "when appropriate",
    "if necessary",
    "when possible",
    "reasonable",
    "appropriate",
    "suitable",
];

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\b").unwrap())
}

/// Scan an item for wording that admits multiple readings.
///
/// Each category contributes at most one flag per constraint (except
/// missing units, which flags every bare number). The item itself is
/// never modified; callers attach the returned flags.
pub fn analyze_ambiguity(item: &KnowledgeItem) -> Vec<AmbiguityFlag> {
    let mut flags = Vec::new();

    if let Some(spec) = item.specification() {
        for (i, constraint) in spec.constraints.iter().enumerate() {
            let expression = constraint.expression.to_lowercase();

            if constraint.kind == Some(ConstraintKind::TimeBased) {
                if let Some(vague) = first_match(&expression, VAGUE_TIME_WORDS) {
                    flags.push(AmbiguityFlag {
                        field: format!("specification.constraints[{i}].expression"),
                        interpretations: vec![
                            "Could mean within minutes".to_string(),
                            "Could mean within hours".to_string(),
                            "Could mean within days".to_string(),
                        ],
                        clarification_question: format!(
                            "What does '{vague}' mean exactly? Please specify a concrete time period."
                        ),
                    });
                }
            }

            if let Some(unclear) = first_match(&expression, UNCLEAR_BOUNDARY_WORDS) {
                flags.push(AmbiguityFlag {
                    field: format!("specification.constraints[{i}].expression"),
                    interpretations: vec![
                        "Could be interpreted as inclusive".to_string(),
                        "Could be interpreted as exclusive".to_string(),
                        "Could have a tolerance range".to_string(),
                    ],
                    clarification_question: format!(
                        "What does '{unclear}' mean exactly? Is there a tolerance range?"
                    ),
                });
            }

            if matches!(
                constraint.kind,
                Some(ConstraintKind::TimeBased) | Some(ConstraintKind::ValueBased)
            ) {
                let has_unit_word = UNIT_WORDS.iter().any(|unit| expression.contains(unit));
                if !has_unit_word && constraint.unit.is_empty() {
                    for number in number_regex().find_iter(&constraint.expression) {
                        flags.push(AmbiguityFlag {
                            field: format!("specification.constraints[{i}].unit"),
                            interpretations: vec![
                                "Could be hours".to_string(),
                                "Could be days".to_string(),
                                "Could be minutes".to_string(),
                            ],
                            clarification_question: format!(
                                "What unit does '{}' refer to? (hours, days, minutes, etc.)",
                                number.as_str()
                            ),
                        });
                    }
                }
            }

            if constraint.boundary.is_none() {
                flags.push(AmbiguityFlag {
                    field: format!("specification.constraints[{i}].boundary"),
                    interpretations: vec![
                        "Could be inclusive (<=)".to_string(),
                        "Could be exclusive (<)".to_string(),
                    ],
                    clarification_question: format!(
                        "Is the boundary inclusive (<=) or exclusive (<) for constraint: {}?",
                        constraint.expression
                    ),
                });
            }

            if let Some(word) = first_match(&expression, MODAL_WORDS) {
                flags.push(AmbiguityFlag {
                    field: format!("specification.constraints[{i}].expression"),
                    interpretations: vec![
                        "Could mean 'must' (mandatory)".to_string(),
                        "Could mean 'may' (optional)".to_string(),
                        "Could mean 'should' (recommended)".to_string(),
                    ],
                    clarification_question: format!(
                        "Does '{word}' mean 'must', 'may', or 'should'?"
                    ),
                });
            }
        }
    }

    if !item.description.is_empty() {
        let description = item.description.to_lowercase();
        if let Some(vague) = first_match(&description, VAGUE_DESCRIPTION_WORDS) {
            flags.push(AmbiguityFlag {
                field: "description".to_string(),
                interpretations: vec![
                    "Could have multiple interpretations".to_string(),
                    "Needs concrete criteria".to_string(),
                ],
                clarification_question: format!(
                    "What does '{vague}' mean exactly? Please provide concrete criteria."
                ),
            });
        }
    }

    flags
}

fn first_match<'a>(haystack: &str, patterns: &[&'a str]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| haystack.contains(**pattern))
        .copied()
}
