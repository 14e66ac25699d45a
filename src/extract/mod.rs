//! Knowledge extraction: chunking, prompting, parsing, scoring, and the
//! regex fallback path.

pub mod chunker;
pub mod extractor;
pub mod fallback;
pub mod parser;
pub mod prompt;
pub mod scoring;
pub mod types;

pub use chunker::TextChunker;
pub use extractor::KnowledgeExtractor;
pub use fallback::FallbackExtractor;
pub use scoring::{classify_confidence, ConfidenceLevel, ConfidenceScorer};
pub use types::{
    BusinessRule, ExtractOptions, ExtractRequest, ExtractResult, ExtractionError,
    ExtractionMetadata, ExtractionSource, SchemaType,
};
