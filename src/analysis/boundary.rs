//! Boundary semantics detection for numeric and time constraints.

use crate::error::{KnowlexError, Result};
use crate::model::{Boundary, Constraint};

// Ordered pattern tables. Within the operator/phrase step the inclusive
// patterns must be checked first: "<=" contains "<" and "not more than"
// contains "more than", so the longer inclusive form has to win.
const INCLUSIVE_PATTERNS: &[&str] = &[
    "<=",
    ">=",
    "at most",
    "at least",
    "up to",
    "within",
    "not more than",
    "not less than",
];

const EXCLUSIVE_PATTERNS: &[&str] = &[
    "<",
    ">",
    "before",
    "after",
    "less than",
    "more than",
    "under",
    "over",
];

/// Infer whether a constraint expression bounds its limit inclusively
/// or exclusively.
///
/// Precedence, first match wins:
/// 1. explicit "exclusive"/"strictly" or "inclusive"/"including"
/// 2. operators and comparison phrases
/// 3. "between" / "exactly" (both inclusive by convention)
///
/// Anything else is ambiguous and must be surfaced to a human, never
/// silently defaulted.
pub fn detect_boundary(expression: &str) -> Result<Boundary> {
    let normalized = expression
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if normalized.contains("exclusive") || normalized.contains("strictly") {
        return Ok(Boundary::Exclusive);
    }
    if normalized.contains("inclusive") || normalized.contains("including") {
        return Ok(Boundary::Inclusive);
    }

    for pattern in INCLUSIVE_PATTERNS {
        if normalized.contains(pattern) {
            return Ok(Boundary::Inclusive);
        }
    }
    for pattern in EXCLUSIVE_PATTERNS {
        if normalized.contains(pattern) {
            return Ok(Boundary::Exclusive);
        }
    }

    if normalized.contains("between") || normalized.contains("exactly") {
        return Ok(Boundary::Inclusive);
    }

    Err(KnowlexError::AmbiguousBoundary(expression.to_string()))
}

/// Fill in a constraint's boundary from its expression. A boundary that
/// is already set is left alone; an undetectable one propagates the
/// ambiguity error for the caller to flag.
pub fn normalize_boundary(constraint: &mut Constraint) -> Result<()> {
    if constraint.boundary.is_some() {
        return Ok(());
    }
    constraint.boundary = Some(detect_boundary(&constraint.expression)?);
    Ok(())
}
