// mod.rs - Input adapters module

pub mod annotation;
pub mod manifest;
pub mod names;
pub mod resolve;
pub mod sequence;

// Re-export main types for convenience
pub use manifest::Manifest;
pub use names::{NameGrammar, ParsedGenome};
pub use resolve::{TypeResolution, TypeResolver};
pub use sequence::{ContigAlignment, ContigIssue, SequenceRecord};
