//! Deterministic regex-based extraction used when the LLM path is
//! disabled or fails. Produces lower-confidence results with no external
//! calls.

use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::{KnowlexError, Result};
use crate::model::{Constraint, ConstraintKind, Exception, Specification};

use super::types::{
    BusinessRule, ExtractionMetadata, ExtractionSource, ExtractResult,
};

const FALLBACK_CONFIDENCE: f64 = 0.5;

fn must_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:the\s+)?(?:system|user|application|orders?|customers?|payments?)\s+(?:must|shall|should)\s+(.+?)(?:\.|$)",
        )
        .expect("invalid must regex")
    })
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)within\s+(\d+)\s+(hours?|days?|minutes?|seconds?)")
            .expect("invalid time regex")
    })
}

fn prohibition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:must\s+not|shall\s+not|cannot|should\s+not)\s+(.+?)(?:\.|$)")
            .expect("invalid prohibition regex")
    })
}

fn exception_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:,\s*)?except\s+(?:for\s+)?(.+?)(?:\.|$)").expect("invalid except regex")
    })
}

/// Pattern-based business rule extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract business rules from text using fixed patterns.
    ///
    /// Rule IDs are assigned per call in encounter order, so identical
    /// input yields identical output. Returns an error when no pattern
    /// matches; the caller decides whether that is fatal.
    pub fn extract(&self, text: &str) -> Result<ExtractResult> {
        let mut rules: Vec<BusinessRule> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut counter = 0usize;

        let mut next_id = |counter: &mut usize| {
            *counter += 1;
            format!("BR-{:03}", *counter)
        };

        for cap in must_regex().captures_iter(text) {
            let full = cap.get(0).map(|m| m.as_str()).unwrap_or_default();
            if !seen.insert(full.to_lowercase()) {
                continue;
            }
            let requirement = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let mut rule = requirement_rule(next_id(&mut counter), full, requirement);
            attach_exceptions(&mut rule, full);
            rules.push(rule);
        }

        for cap in time_regex().captures_iter(text) {
            let full = cap.get(0).map(|m| m.as_str()).unwrap_or_default();
            if !seen.insert(full.to_lowercase()) {
                continue;
            }
            let amount = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let unit = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
            rules.push(time_rule(next_id(&mut counter), full, amount, unit));
        }

        for cap in prohibition_regex().captures_iter(text) {
            let full = cap.get(0).map(|m| m.as_str()).unwrap_or_default();
            if !seen.insert(full.to_lowercase()) {
                continue;
            }
            let forbidden = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            rules.push(prohibition_rule(next_id(&mut counter), full, forbidden));
        }

        if rules.is_empty() {
            return Err(KnowlexError::Extraction(
                "no business rules found via regex patterns".to_string(),
            ));
        }

        Ok(ExtractResult {
            business_rules: rules,
            entities: Vec::new(),
            api_contracts: Vec::new(),
            user_journeys: Vec::new(),
            glossary: Vec::new(),
            confidence: FALLBACK_CONFIDENCE,
            source: ExtractionSource::Regex,
            errors: Vec::new(),
            metadata: ExtractionMetadata {
                processed_at: Some(Utc::now()),
                ..Default::default()
            },
        })
    }
}

fn requirement_rule(id: String, sentence: &str, requirement: &str) -> BusinessRule {
    // Time phrasing upgrades the constraint to time_based with a unit
    let (kind, unit) = match time_regex().captures(requirement) {
        Some(cap) => (
            ConstraintKind::TimeBased,
            cap.get(2)
                .map(|m| m.as_str().trim_end_matches('s').to_string())
                .unwrap_or_default(),
        ),
        None => (ConstraintKind::StateBased, String::new()),
    };

    BusinessRule {
        id,
        version: "1.0".to_string(),
        status: "draft".to_string(),
        title: truncate(requirement, 100),
        description: sentence.to_string(),
        priority: "medium".to_string(),
        specification: Specification {
            constraints: vec![Constraint {
                id: "C1".to_string(),
                kind: Some(kind),
                expression: requirement.to_string(),
                unit,
                ..Default::default()
            }],
            ..Default::default()
        },
        confidence: FALLBACK_CONFIDENCE,
        ..Default::default()
    }
}

fn time_rule(id: String, sentence: &str, amount: &str, unit: &str) -> BusinessRule {
    BusinessRule {
        id,
        version: "1.0".to_string(),
        status: "draft".to_string(),
        title: format!("Time Constraint: {amount} {unit}"),
        description: sentence.to_string(),
        priority: "medium".to_string(),
        specification: Specification {
            constraints: vec![Constraint {
                id: "C1".to_string(),
                kind: Some(ConstraintKind::TimeBased),
                expression: format!("Within {amount} {unit}"),
                unit: unit.trim_end_matches('s').to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
        confidence: FALLBACK_CONFIDENCE,
        ..Default::default()
    }
}

fn prohibition_rule(id: String, sentence: &str, forbidden: &str) -> BusinessRule {
    BusinessRule {
        id,
        version: "1.0".to_string(),
        status: "draft".to_string(),
        title: format!("Prohibition: {}", truncate(forbidden, 80)),
        description: sentence.to_string(),
        priority: "high".to_string(),
        specification: Specification {
            constraints: vec![Constraint {
                id: "C1".to_string(),
                kind: Some(ConstraintKind::StateBased),
                expression: format!("NOT: {forbidden}"),
                ..Default::default()
            }],
            ..Default::default()
        },
        confidence: FALLBACK_CONFIDENCE,
        ..Default::default()
    }
}

// "... except for international orders which get 48 hours" becomes an
// exception entry on the rule extracted from the same sentence.
fn attach_exceptions(rule: &mut BusinessRule, sentence: &str) {
    for (i, cap) in exception_regex().captures_iter(sentence).enumerate() {
        if let Some(condition) = cap.get(1) {
            rule.specification.exceptions.push(Exception {
                id: format!("E{}", i + 1),
                condition: condition.as_str().trim().to_string(),
                ..Default::default()
            });
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
