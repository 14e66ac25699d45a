//! Test requirement generation from business rule specifications.

use crate::model::{
    Boundary, ConstraintKind, Expected, KnowledgeItem, Specification, TestKind, TestRequirement,
};

/// Derive test requirements from a business rule's specification.
///
/// Rules without constraints (and non-rule items) produce no tests. Any
/// rule that does produce tests gets at least two: a happy path and an
/// error case.
pub fn generate_test_requirements(item: &KnowledgeItem) -> Vec<TestRequirement> {
    let spec = match item.specification() {
        Some(spec) if !spec.constraints.is_empty() => spec,
        _ => return Vec::new(),
    };

    let rule_id = if item.id.is_empty() {
        "BR-UNKNOWN"
    } else {
        &item.id
    };
    let name_stem = snake_case(&item.title);
    let mut counter = 1;
    let mut tests = Vec::new();

    let constraint_descs: Vec<&str> = spec
        .constraints
        .iter()
        .map(|c| c.expression.as_str())
        .collect();
    tests.push(TestRequirement {
        id: format!("{rule_id}-T{counter}"),
        name: format!("test_{name_stem}_happy_path"),
        kind: TestKind::HappyPath,
        priority: "critical".to_string(),
        scenario: format!(
            "Execute {} when: {}",
            item.title,
            constraint_descs.join(" and ")
        ),
        expected: Expected {
            success: true,
            error: String::new(),
        },
    });
    counter += 1;

    for (i, constraint) in spec.constraints.iter().enumerate() {
        tests.push(TestRequirement {
            id: format!("{rule_id}-T{counter}"),
            name: format!("test_{name_stem}_constraint_{}_violation", i + 1),
            kind: TestKind::ErrorCase,
            priority: "critical".to_string(),
            scenario: format!("Violate constraint: {}", constraint.expression),
            expected: Expected {
                success: false,
                error: error_code_for(spec, i),
            },
        });
        counter += 1;

        if matches!(
            constraint.kind,
            Some(ConstraintKind::TimeBased) | Some(ConstraintKind::ValueBased)
        ) {
            let inclusive = constraint.boundary == Some(Boundary::Inclusive);
            let boundary_label = constraint.boundary.map(|b| b.as_str()).unwrap_or("");
            tests.push(TestRequirement {
                id: format!("{rule_id}-T{counter}"),
                name: format!("test_{name_stem}_boundary_{}", i + 1),
                kind: TestKind::EdgeCase,
                priority: "high".to_string(),
                scenario: format!(
                    "Test boundary condition: {} (boundary: {})",
                    constraint.expression, boundary_label
                ),
                expected: Expected {
                    success: inclusive,
                    // Only an explicitly exclusive boundary carries an
                    // error code; an unset boundary fails without one.
                    error: if constraint.boundary == Some(Boundary::Exclusive) {
                        error_code_for(spec, 0)
                    } else {
                        String::new()
                    },
                },
            });
            counter += 1;
        }
    }

    for (i, exception) in spec.exceptions.iter().enumerate() {
        tests.push(TestRequirement {
            id: format!("{rule_id}-T{counter}"),
            name: format!("test_{name_stem}_exception_{}", i + 1),
            kind: TestKind::ExceptionCase,
            priority: "high".to_string(),
            scenario: format!("Apply exception: {}", exception.condition),
            expected: Expected {
                success: true,
                error: String::new(),
            },
        });
        counter += 1;
    }

    // Every rule with tests must carry at least happy path + error case.
    if tests.len() < 2 {
        tests.push(TestRequirement {
            id: format!("{rule_id}-T{counter}"),
            name: format!("test_{name_stem}_generic_error"),
            kind: TestKind::ErrorCase,
            priority: "critical".to_string(),
            scenario: format!("Generic error case for {}", item.title),
            expected: Expected {
                success: false,
                error: error_code_for(spec, 0),
            },
        });
    }

    tests
}

/// Error code for the constraint at `index`, falling back to the first
/// error case, or empty when the rule declares none.
fn error_code_for(spec: &Specification, index: usize) -> String {
    spec.error_cases
        .get(index)
        .or_else(|| spec.error_cases.first())
        .map(|case| case.error_code.clone())
        .unwrap_or_default()
}

fn snake_case(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ErrorCase, Exception, ItemBody, Specification};

    fn item_with_spec(spec: Specification) -> KnowledgeItem {
        KnowledgeItem {
            id: "BR-001".to_string(),
            version: "1.0".to_string(),
            status: String::new(),
            title: "Order Shipping Deadline".to_string(),
            description: String::new(),
            category: String::new(),
            priority: String::new(),
            body: ItemBody::BusinessRule {
                specification: spec,
            },
            test_requirements: Vec::new(),
            traceability: Default::default(),
            metadata: None,
            ambiguity_flags: Vec::new(),
        }
    }

    fn time_constraint(boundary: Option<Boundary>) -> Constraint {
        Constraint {
            id: "C1".to_string(),
            kind: Some(ConstraintKind::TimeBased),
            expression: "ship within 24 hours".to_string(),
            pseudocode: String::new(),
            boundary,
            unit: "hour".to_string(),
        }
    }

    #[test]
    fn test_no_constraints_no_tests() {
        let item = item_with_spec(Specification::default());
        assert!(generate_test_requirements(&item).is_empty());
    }

    #[test]
    fn test_happy_path_joins_constraint_expressions() {
        let mut second = time_constraint(Some(Boundary::Inclusive));
        second.expression = "payment is confirmed".to_string();
        second.kind = Some(ConstraintKind::StateBased);
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive)), second],
            ..Default::default()
        });

        let tests = generate_test_requirements(&item);
        assert_eq!(tests[0].kind, TestKind::HappyPath);
        assert_eq!(tests[0].id, "BR-001-T1");
        assert_eq!(tests[0].name, "test_order_shipping_deadline_happy_path");
        assert_eq!(
            tests[0].scenario,
            "Execute Order Shipping Deadline when: ship within 24 hours and payment is confirmed"
        );
        assert!(tests[0].expected.success);
    }

    #[test]
    fn test_error_case_per_constraint_with_codes() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            error_cases: vec![ErrorCase {
                condition: "shipped late".to_string(),
                error_code: "SHIPPING_DEADLINE_EXCEEDED".to_string(),
                error_message: "Order missed the 24 hour window".to_string(),
                http_status: Some(422),
            }],
            ..Default::default()
        });

        let tests = generate_test_requirements(&item);
        let error_test = tests
            .iter()
            .find(|t| t.kind == TestKind::ErrorCase)
            .unwrap();
        assert_eq!(error_test.expected.error, "SHIPPING_DEADLINE_EXCEEDED");
        assert!(!error_test.expected.success);
        assert!(error_test.scenario.contains("ship within 24 hours"));
    }

    #[test]
    fn test_inclusive_boundary_edge_case_succeeds() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        let edge = tests.iter().find(|t| t.kind == TestKind::EdgeCase).unwrap();
        assert!(edge.expected.success);
        assert!(edge.scenario.contains("boundary: inclusive"));
        assert!(edge.expected.error.is_empty());
    }

    #[test]
    fn test_exclusive_boundary_edge_case_fails_with_code() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Exclusive))],
            error_cases: vec![ErrorCase {
                condition: "late".to_string(),
                error_code: "TOO_LATE".to_string(),
                error_message: String::new(),
                http_status: None,
            }],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        let edge = tests.iter().find(|t| t.kind == TestKind::EdgeCase).unwrap();
        assert!(!edge.expected.success);
        assert_eq!(edge.expected.error, "TOO_LATE");
    }

    #[test]
    fn test_unset_boundary_edge_case_fails_without_code() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(None)],
            error_cases: vec![ErrorCase {
                condition: "late".to_string(),
                error_code: "TOO_LATE".to_string(),
                error_message: String::new(),
                http_status: None,
            }],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        let edge = tests.iter().find(|t| t.kind == TestKind::EdgeCase).unwrap();
        assert!(!edge.expected.success);
        assert!(edge.expected.error.is_empty());
        assert!(edge.scenario.ends_with("(boundary: )"));
    }

    #[test]
    fn test_state_based_constraint_has_no_edge_case() {
        let mut constraint = time_constraint(Some(Boundary::Inclusive));
        constraint.kind = Some(ConstraintKind::StateBased);
        let item = item_with_spec(Specification {
            constraints: vec![constraint],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        assert!(tests.iter().all(|t| t.kind != TestKind::EdgeCase));
    }

    #[test]
    fn test_exception_cases_generated() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            exceptions: vec![Exception {
                id: "E1".to_string(),
                condition: "international orders".to_string(),
                modified_constraint: "48 hours".to_string(),
                applies_to: Vec::new(),
                source: String::new(),
            }],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        let exception = tests
            .iter()
            .find(|t| t.kind == TestKind::ExceptionCase)
            .unwrap();
        assert_eq!(exception.scenario, "Apply exception: international orders");
        assert!(exception.expected.success);
        assert_eq!(exception.priority, "high");
    }

    #[test]
    fn test_minimum_of_two_tests() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        assert!(tests.len() >= 2);
    }

    #[test]
    fn test_ids_are_sequential() {
        let item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            exceptions: vec![Exception {
                id: "E1".to_string(),
                condition: "weekends".to_string(),
                modified_constraint: String::new(),
                applies_to: Vec::new(),
                source: String::new(),
            }],
            ..Default::default()
        });
        let tests = generate_test_requirements(&item);
        for (i, test) in tests.iter().enumerate() {
            assert_eq!(test.id, format!("BR-001-T{}", i + 1));
        }
    }

    #[test]
    fn test_missing_id_uses_placeholder() {
        let mut item = item_with_spec(Specification {
            constraints: vec![time_constraint(Some(Boundary::Inclusive))],
            ..Default::default()
        });
        item.id = String::new();
        let tests = generate_test_requirements(&item);
        assert!(tests[0].id.starts_with("BR-UNKNOWN-T"));
    }
}
