//! Post-extraction normalization: boundary resolution, ambiguity
//! flagging, and test requirement attachment.

pub mod ambiguity;
pub mod boundary;

pub use ambiguity::analyze_ambiguity;
pub use boundary::{detect_boundary, normalize_boundary};

use crate::model::{KnowledgeItem, Metadata};
use crate::testgen::generate_test_requirements;

/// Run the full normalization pass over one extracted item.
///
/// Boundaries that cannot be detected stay unset; the ambiguity analyzer
/// flags them instead of failing the item. Flags feed the metadata's
/// clarification state, and business rules get test requirements if they
/// do not already carry any.
pub fn enrich_item(item: &mut KnowledgeItem) {
    if let Some(spec) = item.specification_mut() {
        for constraint in &mut spec.constraints {
            if let Err(e) = normalize_boundary(constraint) {
                log::debug!("constraint {} stays ambiguous: {}", constraint.id, e);
            }
        }
    }

    let flags = analyze_ambiguity(item);
    if !flags.is_empty() {
        let questions: Vec<String> = flags
            .iter()
            .map(|flag| flag.clarification_question.clone())
            .filter(|q| !q.is_empty())
            .collect();
        let metadata = item.metadata.get_or_insert_with(Metadata::default);
        metadata.needs_clarification = true;
        metadata.clarification_questions = questions;
    }
    item.ambiguity_flags = flags;

    if item.test_requirements.is_empty() {
        item.test_requirements = generate_test_requirements(item);
    }
}
