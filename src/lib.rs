pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod model;
pub mod schema;
pub mod testgen;
pub mod tracker;

pub use config::Config;
pub use error::{KnowlexError, Result};
pub use extract::{ExtractRequest, ExtractResult, KnowledgeExtractor, SchemaType};
pub use model::KnowledgeItem;
