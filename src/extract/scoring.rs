//! Confidence scoring for extracted business rules.
//!
//! The score is a heuristic estimate of structural completeness and
//! evidence quality, not of semantic correctness.

use regex::Regex;
use std::sync::OnceLock;

use super::types::BusinessRule;

/// Confidence classification bands. Lower edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    /// score >= 0.8
    High,
    /// 0.5 <= score < 0.8
    Medium,
    /// score < 0.5
    Low,
}

/// Classify a confidence score into a level.
pub fn classify_confidence(score: f64) -> ConfidenceLevel {
    if score >= 0.8 {
        ConfidenceLevel::High
    } else if score >= 0.5 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

fn digit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("invalid digit regex"))
}

/// Multi-factor confidence scorer.
///
/// Weighted blend: structure 0.30, semantics 0.20, traceability 0.25,
/// constraints 0.25.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a single rule into [0, 1].
    pub fn score_rule(&self, rule: &BusinessRule) -> f64 {
        let score = self.score_structure(rule) * 0.30
            + self.score_semantics(rule) * 0.20
            + self.score_traceability(rule) * 0.25
            + self.score_constraints(rule) * 0.25;
        score.min(1.0)
    }

    fn score_structure(&self, rule: &BusinessRule) -> f64 {
        let mut score = 0.0;
        if !rule.id.is_empty() {
            score += 0.15;
        }
        if !rule.title.is_empty() {
            score += 0.35;
        }
        if rule.description.len() > 20 {
            score += 0.40;
        }
        if !rule.priority.is_empty() {
            score += 0.05;
        }
        if !rule.status.is_empty() {
            score += 0.05;
        }
        f64::min(score, 1.0)
    }

    fn score_semantics(&self, rule: &BusinessRule) -> f64 {
        if rule.description.is_empty() {
            return 0.0;
        }
        let desc = rule.description.to_lowercase();
        let mut score = 0.0;

        const ACTION_WORDS: [&str; 6] = ["must", "shall", "should", "will", "can", "may"];
        if ACTION_WORDS.iter().any(|w| desc.contains(w)) {
            score += 0.3;
        }
        if digit_regex().is_match(&desc) {
            score += 0.3;
        }
        // Any reasonable-length description earns the density credit
        if rule.description.len() >= 20 {
            score += 0.5;
        }

        f64::min(score, 1.0)
    }

    // Presence of any traceability evidence is full credit, not a blend.
    fn score_traceability(&self, rule: &BusinessRule) -> f64 {
        if rule.traceability.has_evidence() {
            1.0
        } else {
            0.0
        }
    }

    fn score_constraints(&self, rule: &BusinessRule) -> f64 {
        let constraints = &rule.specification.constraints;
        if constraints.is_empty() {
            return 0.0;
        }
        let mut score = 0.7;
        let has_pseudocode = constraints.iter().any(|c| !c.pseudocode.is_empty());
        let has_kind = constraints.iter().any(|c| c.kind.is_some());
        if has_pseudocode {
            score += 0.3;
        } else if has_kind {
            score += 0.2;
        }
        f64::min(score, 1.0)
    }

    /// Average confidence across rules. Rules that already carry a
    /// confidence keep it; others are scored fresh. Empty input is 0.0.
    pub fn score_overall(&self, rules: &[BusinessRule]) -> f64 {
        if rules.is_empty() {
            return 0.0;
        }
        let total: f64 = rules
            .iter()
            .map(|rule| {
                if rule.confidence > 0.0 {
                    rule.confidence
                } else {
                    self.score_rule(rule)
                }
            })
            .sum();
        total / rules.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintKind, Specification, Traceability};

    fn bare_rule() -> BusinessRule {
        BusinessRule {
            id: "BR-001".to_string(),
            title: "Test Rule".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_score_in_range() {
        let scorer = ConfidenceScorer::new();
        let rule = BusinessRule {
            description: "The system must respond within 2 seconds".to_string(),
            specification: Specification {
                constraints: vec![Constraint {
                    id: "C1".to_string(),
                    kind: Some(ConstraintKind::TimeBased),
                    expression: "within 2 seconds".to_string(),
                    pseudocode: "latency <= 2".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            traceability: Traceability {
                source_document: "slo.md".to_string(),
                ..Default::default()
            },
            ..bare_rule()
        };
        let score = scorer.score_rule(&rule);
        assert!((0.0..=1.0).contains(&score));
        assert!(score > 0.8, "complete rule should score high, got {score}");
    }

    #[test]
    fn test_score_monotonic_in_optional_fields() {
        let scorer = ConfidenceScorer::new();
        let mut rule = bare_rule();
        let base = scorer.score_rule(&rule);

        rule.description = "The system must validate all input within 5 seconds".to_string();
        let with_description = scorer.score_rule(&rule);
        assert!(with_description >= base);

        rule.traceability.source_document = "requirements.md".to_string();
        let with_trace = scorer.score_rule(&rule);
        assert!(with_trace >= with_description);

        rule.specification.constraints.push(Constraint {
            id: "C1".to_string(),
            kind: Some(ConstraintKind::ValueBased),
            expression: "x > 5".to_string(),
            pseudocode: "x > 5".to_string(),
            ..Default::default()
        });
        let with_constraints = scorer.score_rule(&rule);
        assert!(with_constraints >= with_trace);
    }

    #[test]
    fn test_classify_confidence_bands() {
        assert_eq!(classify_confidence(0.8), ConfidenceLevel::High);
        assert_eq!(classify_confidence(0.79), ConfidenceLevel::Medium);
        assert_eq!(classify_confidence(0.5), ConfidenceLevel::Medium);
        assert_eq!(classify_confidence(0.49), ConfidenceLevel::Low);
        assert_eq!(classify_confidence(1.0), ConfidenceLevel::High);
        assert_eq!(classify_confidence(0.0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_score_overall_empty() {
        assert_eq!(ConfidenceScorer::new().score_overall(&[]), 0.0);
    }

    #[test]
    fn test_score_overall_prefers_existing_confidence() {
        let scorer = ConfidenceScorer::new();
        let mut rule = bare_rule();
        rule.confidence = 0.9;
        let overall = scorer.score_overall(&[rule]);
        assert!((overall - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_overall_averages() {
        let scorer = ConfidenceScorer::new();
        let mut a = bare_rule();
        a.confidence = 1.0;
        let mut b = bare_rule();
        b.confidence = 0.5;
        let overall = scorer.score_overall(&[a, b]);
        assert!((overall - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_constraints_scores_zero_constraint_factor() {
        let scorer = ConfidenceScorer::new();
        let rule = bare_rule();
        // Structure-only rule: id + title = (0.15 + 0.35) * 0.30
        let score = scorer.score_rule(&rule);
        assert!(score < 0.5, "bare rule should be low confidence, got {score}");
    }
}
