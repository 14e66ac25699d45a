pub mod item;
pub mod meta;
pub mod spec;

pub use item::{
    ApiRequest, ApiResponse, EntityField, Invariant, ItemBody, JourneyStep, KnowledgeItem,
    Relationship,
};
pub use meta::{AmbiguityFlag, Expected, Metadata, TestKind, TestRequirement, Traceability};
pub use spec::{Boundary, Constraint, ConstraintKind, ErrorCase, Exception, SideEffect, Specification};
